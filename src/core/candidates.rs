use chrono::{DateTime, Utc};

use crate::core::filters::{
    excluded_ids, group_by_target, matches_preference, passes_exclusions, reshow_verdict,
    within_age_range,
};
use crate::error::MatchingError;
use crate::models::{Attendee, ExclusionRecord, MatchingPolicy, SwipeDecision};

/// Candidate selection - the four-stage filtering pipeline
///
/// # Pipeline Stages
/// 1. Unmatch/block exclusions
/// 2. Actor's gender preference
/// 3. Actor's accepted age range
/// 4. Swipe history ("second chance" reshow policy)
///
/// Output keeps roster order. No scoring is applied.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    policy: MatchingPolicy,
}

impl CandidateFilter {
    pub fn new(policy: MatchingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchingPolicy {
        &self.policy
    }

    /// Attendees `actor` may be shown next
    ///
    /// # Arguments
    /// * `actor` - The actor's own attendee profile
    /// * `roster` - Everyone attending the event, in display order
    /// * `history` - The actor's swipe decisions in this event
    /// * `exclusions` - Unmatch/block records involving the actor
    /// * `now` - Evaluation instant for the reshow cooldown
    ///
    /// # Errors
    /// `IncompleteProfile` if the actor has no gender or interest set.
    pub fn next_candidates(
        &self,
        actor: &Attendee,
        roster: Vec<Attendee>,
        history: &[SwipeDecision],
        exclusions: &[ExclusionRecord],
        now: DateTime<Utc>,
    ) -> Result<Vec<Attendee>, MatchingError> {
        let interest = match (actor.gender, actor.interested_in) {
            (Some(_), Some(interest)) => interest,
            _ => {
                return Err(MatchingError::IncompleteProfile {
                    user_id: actor.user_id.clone(),
                })
            }
        };

        let total = roster.len();
        let excluded = excluded_ids(&actor.user_id, exclusions);
        let by_target = group_by_target(&actor.user_id, history);
        let default_range = self.policy.default_age_range;

        let candidates: Vec<Attendee> = roster
            .into_iter()
            .filter(|candidate| candidate.user_id != actor.user_id)
            // Stage 1: exclusions
            .filter(|candidate| passes_exclusions(candidate, &excluded))
            // Stage 2: preference
            .filter(|candidate| matches_preference(interest, candidate))
            // Stage 3: age range
            .filter(|candidate| within_age_range(actor, candidate, default_range))
            // Stage 4: reshow policy
            .filter(|candidate| {
                by_target
                    .get(candidate.user_id.as_str())
                    .map(|decisions| reshow_verdict(decisions, now, &self.policy).is_eligible())
                    .unwrap_or(true)
            })
            .collect();

        tracing::debug!(
            actor = %actor.user_id,
            event = %actor.event_id,
            "Candidate pipeline kept {} of {} attendees ({} excluded, {} targets with history)",
            candidates.len(),
            total,
            excluded.len(),
            by_target.len()
        );

        Ok(candidates)
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(MatchingPolicy::default())
    }
}
