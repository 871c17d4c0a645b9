use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::core::candidates::CandidateFilter;
use crate::core::recorder::SwipeRecorder;
use crate::core::undo::UndoCoordinator;
use crate::error::MatchingError;
use crate::models::{
    CandidateQueue, MatchRecord, MatchingPolicy, QueueState, SwipeDirection, SwipeOutcome,
    UndoOutcome, WindowPhase,
};
use crate::services::{Directory, SwipeStore};

/// Entry point tying candidate selection, swipes, matches and undo together
///
/// Each actor's swipe stream is expected to be sequential; only match
/// creation is contended across actors, and the store resolves that.
#[derive(Clone)]
pub struct MatchEngine {
    directory: Arc<dyn Directory>,
    store: Arc<dyn SwipeStore>,
    filter: CandidateFilter,
    recorder: SwipeRecorder,
    undo: UndoCoordinator,
}

impl MatchEngine {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn SwipeStore>,
        policy: MatchingPolicy,
    ) -> Self {
        Self {
            filter: CandidateFilter::new(policy),
            recorder: SwipeRecorder::new(store.clone(), directory.clone(), &policy),
            undo: UndoCoordinator::new(store.clone(), directory.clone(), policy.undo_grace),
            directory,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn SwipeStore> {
        &self.store
    }

    pub fn policy(&self) -> &MatchingPolicy {
        self.filter.policy()
    }

    /// Candidates for `actor_id` in `event_id`, with the reason for an empty queue
    pub async fn next_candidates(
        &self,
        actor_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CandidateQueue, MatchingError> {
        let window = self.directory.event_window(event_id).await?;
        match window.phase(now) {
            WindowPhase::NotYetOpen => return Ok(CandidateQueue::empty(QueueState::NotYetOpen)),
            WindowPhase::Closed => return Ok(CandidateQueue::empty(QueueState::Closed)),
            WindowPhase::Open => {}
        }

        let actor = self
            .directory
            .attendee_fresh(event_id, actor_id)
            .await?
            .ok_or_else(|| MatchingError::AttendeeNotFound {
                event_id: event_id.to_string(),
                user_id: actor_id.to_string(),
            })?;

        let roster: Vec<_> = self
            .directory
            .roster(event_id)
            .await?
            .into_iter()
            .filter(|a| a.user_id != actor_id)
            .collect();

        if roster.is_empty() {
            // Still surface an incomplete profile before reporting an empty event
            if !actor.is_onboarded() {
                return Err(MatchingError::IncompleteProfile { user_id: actor.user_id });
            }
            return Ok(CandidateQueue::empty(QueueState::NoAttendees));
        }

        let history = self.store.swipes_by_actor(actor_id, event_id).await?;
        let exclusions = self.directory.exclusions(event_id, actor_id).await?;

        let reinstated = self
            .undo
            .reinstated(actor_id, event_id)
            .await
            .and_then(|target_id| roster.iter().find(|a| a.user_id == target_id).cloned())
            .filter(|target| {
                !exclusions
                    .iter()
                    .any(|r| r.excluded_for(actor_id) == Some(target.user_id.as_str()))
            });

        let mut candidates = self
            .filter
            .next_candidates(&actor, roster, &history, &exclusions, now)?;

        if let Some(target) = reinstated {
            candidates.retain(|c| c.user_id != target.user_id);
            candidates.insert(0, target);
        }

        let state = if candidates.is_empty() {
            QueueState::Exhausted
        } else {
            QueueState::Ready
        };

        tracing::debug!(
            actor = %actor_id,
            event = %event_id,
            "Serving {} candidates ({:?})",
            candidates.len(),
            state
        );

        Ok(CandidateQueue { state, candidates })
    }

    /// Record a swipe and arm undo for it
    pub async fn record_swipe(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
        direction: SwipeDirection,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome, MatchingError> {
        let outcome = self
            .recorder
            .record_swipe(actor_id, target_id, event_id, direction, now)
            .await?;

        self.undo.arm(&outcome).await;

        Ok(outcome)
    }

    /// Reverse the actor's last swipe if still inside the grace window
    pub async fn undo_last(
        &self,
        actor_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UndoOutcome, MatchingError> {
        self.undo.undo_last(actor_id, event_id, now).await
    }

    /// Direct match detection for an already-recorded like
    pub async fn try_create_match(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchRecord>, MatchingError> {
        self.recorder
            .detector()
            .try_create_match(actor_id, target_id, event_id, now)
            .await
    }

    /// Matches `user_id` is part of in `event_id`, oldest first
    pub async fn matches_for(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Vec<MatchRecord>, MatchingError> {
        Ok(self.store.matches_for(user_id, event_id).await?)
    }
}
