use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use std::sync::Arc;

use crate::error::MatchingError;
use crate::models::{CanonicalPair, SwipeDecision, SwipeOutcome, UndoOutcome};
use crate::services::{Directory, SwipeStore};

/// Undo state is scoped to one actor in one event
type SessionKey = (String, String);

/// The last swipe an actor may still take back
#[derive(Debug, Clone)]
pub struct UndoState {
    pub decision: SwipeDecision,
    pub deadline: DateTime<Utc>,
}

impl UndoState {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.deadline
    }
}

/// Bounded undo of an actor's most recent swipe
///
/// The deadline is checked against the caller's `now`, so expiry does not
/// depend on timers. The moka TTL only bounds how long stale state lingers.
#[derive(Clone)]
pub struct UndoCoordinator {
    store: Arc<dyn SwipeStore>,
    directory: Arc<dyn Directory>,
    grace: Duration,
    sessions: Cache<SessionKey, UndoState>,
    reinstated: Cache<SessionKey, String>,
}

impl UndoCoordinator {
    pub fn new(store: Arc<dyn SwipeStore>, directory: Arc<dyn Directory>, grace: Duration) -> Self {
        let ttl = grace
            .to_std()
            .unwrap_or_default()
            .max(std::time::Duration::from_secs(1));

        Self {
            store,
            directory,
            grace,
            sessions: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
            reinstated: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(std::time::Duration::from_secs(3600))
                .build(),
        }
    }

    fn key(actor_id: &str, event_id: &str) -> SessionKey {
        (actor_id.to_string(), event_id.to_string())
    }

    /// Track `outcome` as the actor's undoable swipe, replacing any earlier one
    ///
    /// A pending reinstated candidate is consumed by the new decision.
    pub async fn arm(&self, outcome: &SwipeOutcome) {
        let decision = &outcome.decision;
        let key = Self::key(&decision.actor_id, &decision.event_id);

        self.reinstated.invalidate(&key).await;
        self.sessions
            .insert(
                key,
                UndoState {
                    decision: decision.clone(),
                    deadline: decision.created_at + self.grace,
                },
            )
            .await;
    }

    /// Current undo state, if still inside the grace window
    pub async fn pending(&self, actor_id: &str, event_id: &str, now: DateTime<Utc>) -> Option<UndoState> {
        let key = Self::key(actor_id, event_id);
        let state = self.sessions.get(&key).await?;
        if state.is_open(now) {
            Some(state)
        } else {
            self.sessions.invalidate(&key).await;
            None
        }
    }

    /// Target queued to be shown first after an undo
    pub async fn reinstated(&self, actor_id: &str, event_id: &str) -> Option<String> {
        self.reinstated.get(&Self::key(actor_id, event_id)).await
    }

    /// Delete `decision` and, for a like, the pair's match
    ///
    /// The match is looked up rather than remembered: the partner's later like
    /// may have created it after this decision was recorded. The partner's own
    /// like is kept. Returns whether a match was deleted.
    async fn reverse(&self, decision: &SwipeDecision) -> Result<bool, MatchingError> {
        self.store.delete_swipe(decision.id).await?;

        if !decision.is_like() {
            return Ok(false);
        }

        let pair = match CanonicalPair::new(&decision.actor_id, &decision.target_id) {
            Some(pair) => pair,
            None => return Ok(false),
        };

        match self.store.find_match(&decision.event_id, &pair).await? {
            Some(record) => Ok(self.store.delete_match(record.id).await?),
            None => Ok(false),
        }
    }

    /// Reverse the actor's most recent swipe if the grace window is still open
    pub async fn undo_last(
        &self,
        actor_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UndoOutcome, MatchingError> {
        let key = Self::key(actor_id, event_id);

        let state = match self.sessions.remove(&key).await {
            Some(state) if state.is_open(now) => state,
            Some(_) => {
                tracing::debug!(actor = %actor_id, event = %event_id, "Undo window expired");
                return Ok(UndoOutcome::NothingToUndo);
            }
            None => return Ok(UndoOutcome::NothingToUndo),
        };

        let target_id = state.decision.target_id.clone();
        let target = match self.directory.attendee(event_id, &target_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                self.sessions.insert(key, state).await;
                return Err(MatchingError::AttendeeNotFound {
                    event_id: event_id.to_string(),
                    user_id: target_id,
                });
            }
            Err(e) => {
                self.sessions.insert(key, state).await;
                return Err(e.into());
            }
        };

        let match_removed = match self.reverse(&state.decision).await {
            Ok(removed) => removed,
            Err(e) => {
                self.sessions.insert(key, state).await;
                return Err(e);
            }
        };

        self.reinstated.insert(key, target_id).await;

        tracing::info!(
            actor = %actor_id,
            target = %target.user_id,
            event = %event_id,
            "Undid {} (match removed: {})",
            state.decision.direction,
            match_removed
        );

        Ok(UndoOutcome::Reinstated(target))
    }
}
