use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Attendee, CanonicalPair, EventWindow, ExclusionRecord, MatchRecord, SwipeDecision,
};
use crate::services::directory::{Directory, DirectoryError};
use crate::services::store::{StoreError, SwipeStore};

type PairKey = (String, String, String);

/// In-process swipe store for tests and local runs
///
/// Match uniqueness is enforced by the map entry on the canonical key, so two
/// concurrent inserts for the same pair resolve to exactly one record.
#[derive(Default)]
pub struct MemoryStore {
    swipes: RwLock<Vec<SwipeDecision>>,
    matches: DashMap<PairKey, MatchRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn swipe_count(&self) -> usize {
        self.swipes.read().await.len()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    fn pair_key(event_id: &str, pair: &CanonicalPair) -> PairKey {
        (event_id.to_string(), pair.low().to_string(), pair.high().to_string())
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_swipe(&self, swipe: &SwipeDecision) -> Result<(), StoreError> {
        self.swipes.write().await.push(swipe.clone());
        Ok(())
    }

    async fn swipes_by_actor(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError> {
        Ok(self
            .swipes
            .read()
            .await
            .iter()
            .filter(|s| s.actor_id == actor_id && s.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn decisions_between(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError> {
        Ok(self
            .swipes
            .read()
            .await
            .iter()
            .filter(|s| s.actor_id == actor_id && s.target_id == target_id && s.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn has_like(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.swipes.read().await.iter().any(|s| {
            s.actor_id == actor_id
                && s.target_id == target_id
                && s.event_id == event_id
                && s.is_like()
        }))
    }

    async fn delete_swipe(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut swipes = self.swipes.write().await;
        let before = swipes.len();
        swipes.retain(|s| s.id != id);
        Ok(swipes.len() < before)
    }

    async fn find_match(
        &self,
        event_id: &str,
        pair: &CanonicalPair,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .matches
            .get(&Self::pair_key(event_id, pair))
            .map(|entry| entry.value().clone()))
    }

    async fn insert_match_if_absent(
        &self,
        record: &MatchRecord,
    ) -> Result<Option<MatchRecord>, StoreError> {
        if record.user_low >= record.user_high {
            return Err(StoreError::InvalidInput(format!(
                "match pair not canonical: {} / {}",
                record.user_low, record.user_high
            )));
        }

        let key = (
            record.event_id.clone(),
            record.user_low.clone(),
            record.user_high.clone(),
        );

        match self.matches.entry(key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(Some(record.clone()))
            }
        }
    }

    async fn delete_match(&self, id: Uuid) -> Result<bool, StoreError> {
        let key = self
            .matches
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.key().clone());

        Ok(match key {
            Some(key) => self.matches.remove(&key).is_some(),
            None => false,
        })
    }

    async fn matches_for(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let mut matches: Vec<MatchRecord> = self
            .matches
            .iter()
            .filter(|entry| entry.value().event_id == event_id && entry.value().involves(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by_key(|m| m.created_at);
        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// In-process stand-in for the profile, roster, exclusion and event services
///
/// Events without an explicit window are treated as open.
#[derive(Default)]
pub struct MemoryDirectory {
    rosters: DashMap<String, Vec<Attendee>>,
    exclusions: DashMap<String, Vec<ExclusionRecord>>,
    windows: DashMap<String, EventWindow>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an attendee, keeping roster order stable
    pub fn add_attendee(&self, attendee: Attendee) {
        let mut roster = self.rosters.entry(attendee.event_id.clone()).or_default();
        match roster.iter_mut().find(|a| a.user_id == attendee.user_id) {
            Some(existing) => *existing = attendee,
            None => roster.push(attendee),
        }
    }

    pub fn remove_attendee(&self, event_id: &str, user_id: &str) {
        if let Some(mut roster) = self.rosters.get_mut(event_id) {
            roster.retain(|a| a.user_id != user_id);
        }
    }

    pub fn add_exclusion(&self, record: ExclusionRecord) {
        self.exclusions
            .entry(record.event_id.clone())
            .or_default()
            .push(record);
    }

    pub fn set_window(&self, window: EventWindow) {
        self.windows.insert(window.event_id.clone(), window);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError> {
        Ok(self
            .rosters
            .get(event_id)
            .and_then(|roster| roster.iter().find(|a| a.user_id == user_id).cloned()))
    }

    async fn roster(&self, event_id: &str) -> Result<Vec<Attendee>, DirectoryError> {
        Ok(self
            .rosters
            .get(event_id)
            .map(|roster| roster.value().clone())
            .unwrap_or_default())
    }

    async fn exclusions(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Vec<ExclusionRecord>, DirectoryError> {
        Ok(self
            .exclusions
            .get(event_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.excluded_for(user_id).is_some())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn event_window(&self, event_id: &str) -> Result<EventWindow, DirectoryError> {
        Ok(self
            .windows
            .get(event_id)
            .map(|w| w.value().clone())
            .unwrap_or_else(|| EventWindow::always_open(event_id)))
    }
}
