use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::models::{AgeRange, Attendee, ExclusionRecord, InterestedIn, MatchingPolicy, SwipeDecision, SwipeDirection};

/// Ids hidden from `actor_id` by unmatch or block records, in either direction
pub fn excluded_ids<'a>(actor_id: &str, exclusions: &'a [ExclusionRecord]) -> HashSet<&'a str> {
    exclusions
        .iter()
        .filter_map(|record| record.excluded_for(actor_id))
        .collect()
}

/// Stage 1: permanent exclusions
#[inline]
pub fn passes_exclusions(candidate: &Attendee, excluded: &HashSet<&str>) -> bool {
    !excluded.contains(candidate.user_id.as_str())
}

/// Stage 2: the actor's stated interest against the candidate's gender
///
/// Only the actor's preference is checked. Candidates without a gender pass.
#[inline]
pub fn matches_preference(interest: InterestedIn, candidate: &Attendee) -> bool {
    interest.accepts(candidate.gender)
}

/// Stage 3: candidate age inside the actor's accepted range
///
/// A missing age on either side admits the candidate.
#[inline]
pub fn within_age_range(actor: &Attendee, candidate: &Attendee, default_range: AgeRange) -> bool {
    match (actor.age, candidate.age) {
        (Some(_), Some(age)) => actor.age_range.unwrap_or(default_range).contains(age),
        _ => true,
    }
}

/// Outcome of the reshow policy for one actor/candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReshowVerdict {
    /// Never decided on, or the last pass has cooled down
    Eligible,
    /// Decision cap reached
    Exhausted,
    /// Last decision was a like
    Liked,
    /// Last decision was a pass inside the cooldown
    CoolingDown,
}

impl ReshowVerdict {
    pub fn is_eligible(self) -> bool {
        self == ReshowVerdict::Eligible
    }
}

/// Stage 4: the "second chance" reshow policy over one pair's decisions
pub fn reshow_verdict(
    decisions: &[&SwipeDecision],
    now: DateTime<Utc>,
    policy: &MatchingPolicy,
) -> ReshowVerdict {
    if decisions.len() >= policy.max_decisions_per_pair {
        return ReshowVerdict::Exhausted;
    }

    // max_by_key keeps the last of equal timestamps, i.e. the later insert
    let latest = match decisions.iter().max_by_key(|d| d.created_at) {
        Some(latest) => latest,
        None => return ReshowVerdict::Eligible,
    };

    match latest.direction {
        SwipeDirection::Like => ReshowVerdict::Liked,
        SwipeDirection::Pass if now - latest.created_at < policy.reshow_cooldown => {
            ReshowVerdict::CoolingDown
        }
        SwipeDirection::Pass => ReshowVerdict::Eligible,
    }
}

/// Groups an actor's decisions by target, preserving store order per target
pub fn group_by_target<'a>(
    actor_id: &str,
    history: &'a [SwipeDecision],
) -> HashMap<&'a str, Vec<&'a SwipeDecision>> {
    let mut grouped: HashMap<&str, Vec<&SwipeDecision>> = HashMap::new();
    for decision in history.iter().filter(|d| d.actor_id == actor_id) {
        grouped.entry(decision.target_id.as_str()).or_default().push(decision);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExclusionKind, Gender};
    use chrono::Duration;

    fn decision(direction: SwipeDirection, at: DateTime<Utc>) -> SwipeDecision {
        SwipeDecision::new("actor", "target", "event", direction, at)
    }

    #[test]
    fn test_no_history_is_eligible() {
        let verdict = reshow_verdict(&[], Utc::now(), &MatchingPolicy::default());
        assert_eq!(verdict, ReshowVerdict::Eligible);
    }

    #[test]
    fn test_like_is_terminal() {
        let t0 = Utc::now() - Duration::days(30);
        let like = decision(SwipeDirection::Like, t0);
        let verdict = reshow_verdict(&[&like], Utc::now(), &MatchingPolicy::default());
        assert_eq!(verdict, ReshowVerdict::Liked);
    }

    #[test]
    fn test_pass_cooldown_boundary() {
        let policy = MatchingPolicy::default();
        let t0 = Utc::now();
        let pass = decision(SwipeDirection::Pass, t0);

        assert_eq!(
            reshow_verdict(&[&pass], t0 + Duration::hours(23), &policy),
            ReshowVerdict::CoolingDown
        );
        assert_eq!(
            reshow_verdict(&[&pass], t0 + Duration::hours(24), &policy),
            ReshowVerdict::Eligible
        );
    }

    #[test]
    fn test_cap_overrides_direction() {
        let policy = MatchingPolicy::default();
        let t0 = Utc::now() - Duration::days(10);
        let passes: Vec<SwipeDecision> = (0..3)
            .map(|i| decision(SwipeDirection::Pass, t0 + Duration::days(i)))
            .collect();
        let refs: Vec<&SwipeDecision> = passes.iter().collect();

        assert_eq!(reshow_verdict(&refs, Utc::now(), &policy), ReshowVerdict::Exhausted);
    }

    #[test]
    fn test_latest_decision_wins() {
        let policy = MatchingPolicy::default();
        let t0 = Utc::now() - Duration::days(5);
        let like = decision(SwipeDirection::Like, t0);
        let pass = decision(SwipeDirection::Pass, t0 + Duration::days(2));

        // Out of order on purpose
        let verdict = reshow_verdict(&[&pass, &like], Utc::now(), &policy);
        assert_eq!(verdict, ReshowVerdict::Eligible);
    }

    #[test]
    fn test_age_range_fail_open() {
        let range = AgeRange::default();
        let actor = Attendee::new("a", "e").with_age(30).with_age_range(25, 35);
        let unknown = Attendee::new("b", "e");
        let old = Attendee::new("c", "e").with_age(40);
        let fits = Attendee::new("d", "e").with_age(35);

        assert!(within_age_range(&actor, &unknown, range));
        assert!(!within_age_range(&actor, &old, range));
        assert!(within_age_range(&actor, &fits, range));

        let ageless_actor = Attendee::new("x", "e").with_age_range(25, 35);
        assert!(within_age_range(&ageless_actor, &old, range));
    }

    #[test]
    fn test_default_age_range_applies() {
        let actor = Attendee::new("a", "e").with_age(30);
        let teen = Attendee::new("b", "e").with_age(17);
        assert!(!within_age_range(&actor, &teen, AgeRange::default()));
    }

    #[test]
    fn test_preference_is_unidirectional() {
        // The candidate only wants women; the actor is a man interested in women.
        let candidate = Attendee::new("b", "e")
            .with_gender(Gender::Woman)
            .interested_in(InterestedIn::Women);
        assert!(matches_preference(InterestedIn::Women, &candidate));
    }

    #[test]
    fn test_excluded_ids_symmetric() {
        let records = vec![
            ExclusionRecord::new("alice", "bob", "e", ExclusionKind::Unmatch),
            ExclusionRecord::new("carol", "alice", "e", ExclusionKind::Block),
            ExclusionRecord::new("dave", "erin", "e", ExclusionKind::Block),
        ];
        let ids = excluded_ids("alice", &records);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("bob"));
        assert!(ids.contains("carol"));
    }

    #[test]
    fn test_group_by_target() {
        let now = Utc::now();
        let history = vec![
            SwipeDecision::new("a", "b", "e", SwipeDirection::Pass, now),
            SwipeDecision::new("a", "c", "e", SwipeDirection::Like, now),
            SwipeDecision::new("a", "b", "e", SwipeDirection::Pass, now),
            SwipeDecision::new("z", "b", "e", SwipeDirection::Pass, now),
        ];
        let grouped = group_by_target("a", &history);
        assert_eq!(grouped["b"].len(), 2);
        assert_eq!(grouped["c"].len(), 1);
    }
}
