use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::core::detector::MatchDetector;
use crate::error::MatchingError;
use crate::models::{MatchingPolicy, SwipeDecision, SwipeDirection, SwipeOutcome};
use crate::services::{Directory, SwipeStore};

/// Validates and appends swipe decisions
///
/// Every check runs before the write; a rejected swipe leaves no trace.
#[derive(Clone)]
pub struct SwipeRecorder {
    store: Arc<dyn SwipeStore>,
    directory: Arc<dyn Directory>,
    detector: MatchDetector,
    max_decisions_per_pair: usize,
}

impl SwipeRecorder {
    pub fn new(
        store: Arc<dyn SwipeStore>,
        directory: Arc<dyn Directory>,
        policy: &MatchingPolicy,
    ) -> Self {
        Self {
            detector: MatchDetector::new(store.clone()),
            store,
            directory,
            max_decisions_per_pair: policy.max_decisions_per_pair,
        }
    }

    pub fn detector(&self) -> &MatchDetector {
        &self.detector
    }

    /// Record `actor`'s decision on `target`; on a like, run match detection
    pub async fn record_swipe(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
        direction: SwipeDirection,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome, MatchingError> {
        self.validate(actor_id, target_id, event_id).await?;

        let decision = SwipeDecision::new(actor_id, target_id, event_id, direction, now);
        self.store.insert_swipe(&decision).await?;

        tracing::debug!(
            actor = %actor_id,
            target = %target_id,
            event = %event_id,
            "Recorded {} ({})",
            direction,
            decision.id
        );

        let matched = match direction {
            SwipeDirection::Like => {
                self.detector
                    .try_create_match(actor_id, target_id, event_id, now)
                    .await?
            }
            SwipeDirection::Pass => None,
        };

        Ok(SwipeOutcome { decision, matched })
    }

    async fn validate(&self, actor_id: &str, target_id: &str, event_id: &str) -> Result<(), MatchingError> {
        if actor_id.trim().is_empty() || target_id.trim().is_empty() || event_id.trim().is_empty() {
            return Err(MatchingError::InvalidSwipe("actor, target and event are required".into()));
        }

        if actor_id == target_id {
            return Err(MatchingError::InvalidSwipe("cannot swipe on yourself".into()));
        }

        for user_id in [actor_id, target_id] {
            if self.directory.attendee(event_id, user_id).await?.is_none() {
                return Err(MatchingError::InvalidSwipe(format!(
                    "{} is not attending event {}",
                    user_id, event_id
                )));
            }
        }

        let prior = self
            .store
            .decisions_between(actor_id, target_id, event_id)
            .await?
            .len();
        if prior >= self.max_decisions_per_pair {
            return Err(MatchingError::InvalidSwipe(format!(
                "{} already has {} decisions on {} in event {}",
                actor_id, prior, target_id, event_id
            )));
        }

        Ok(())
    }
}
