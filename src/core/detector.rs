use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::MatchingError;
use crate::models::{CanonicalPair, MatchRecord};
use crate::services::SwipeStore;

/// Detects reciprocal likes and creates the pair's single match record
#[derive(Clone)]
pub struct MatchDetector {
    store: Arc<dyn SwipeStore>,
}

impl MatchDetector {
    pub fn new(store: Arc<dyn SwipeStore>) -> Self {
        Self { store }
    }

    /// Create the match for `actor`/`target` if `target` already likes `actor`
    ///
    /// Returns `None` when there is no reciprocal like yet, or when the pair is
    /// already matched (including a concurrent attempt that won the insert).
    pub async fn try_create_match(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchRecord>, MatchingError> {
        let pair = CanonicalPair::new(actor_id, target_id)
            .ok_or_else(|| MatchingError::InvalidSwipe("cannot match a user with themselves".into()))?;

        if !self.store.has_like(target_id, actor_id, event_id).await? {
            return Ok(None);
        }

        if self.store.find_match(event_id, &pair).await?.is_some() {
            tracing::debug!(event = %event_id, "Pair {} / {} already matched", pair.low(), pair.high());
            return Ok(None);
        }

        let created = self
            .store
            .insert_match_if_absent(&MatchRecord::new(event_id, &pair, now))
            .await?;

        match &created {
            Some(record) => tracing::info!(
                event = %event_id,
                match_id = %record.id,
                "Matched {} with {}",
                pair.low(),
                pair.high()
            ),
            None => tracing::debug!(
                event = %event_id,
                "Lost match insert race for {} / {}",
                pair.low(),
                pair.high()
            ),
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SwipeDecision, SwipeDirection};
    use crate::services::MemoryStore;

    async fn like(store: &MemoryStore, actor: &str, target: &str) {
        let swipe = SwipeDecision::new(actor, target, "gala", SwipeDirection::Like, Utc::now());
        store.insert_swipe(&swipe).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_reciprocal_like() {
        let store = Arc::new(MemoryStore::new());
        like(&store, "alice", "bob").await;
        let detector = MatchDetector::new(store.clone());

        let result = detector.try_create_match("alice", "bob", "gala", Utc::now()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(store.match_count(), 0);
    }

    #[tokio::test]
    async fn test_reciprocal_like_creates_canonical_match() {
        let store = Arc::new(MemoryStore::new());
        like(&store, "zoe", "adam").await;
        like(&store, "adam", "zoe").await;
        let detector = MatchDetector::new(store.clone());

        let record = detector
            .try_create_match("zoe", "adam", "gala", Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.user_low, "adam");
        assert_eq!(record.user_high, "zoe");

        // Second attempt from the other side is a no-op
        let again = detector.try_create_match("adam", "zoe", "gala", Utc::now()).await.unwrap();
        assert!(again.is_none());
        assert_eq!(store.match_count(), 1);
    }

    #[tokio::test]
    async fn test_pass_is_not_reciprocal() {
        let store = Arc::new(MemoryStore::new());
        let pass = SwipeDecision::new("bob", "alice", "gala", SwipeDirection::Pass, Utc::now());
        store.insert_swipe(&pass).await.unwrap();
        like(&store, "alice", "bob").await;
        let detector = MatchDetector::new(store.clone());

        let result = detector.try_create_match("alice", "bob", "gala", Utc::now()).await.unwrap();
        assert!(result.is_none());
    }
}
