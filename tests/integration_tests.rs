// Integration tests for Mingle

use chrono::{DateTime, Duration, Utc};
use mingle::models::{
    Attendee, ExclusionKind, ExclusionRecord, Gender, InterestedIn, MatchingPolicy, QueueState,
    SwipeDirection, UndoOutcome,
};
use mingle::services::{MemoryDirectory, MemoryStore, SwipeStore};
use mingle::{MatchEngine, MatchingError};
use std::sync::Arc;

const EVENT: &str = "spring-gala";

fn attendee(id: &str, gender: Gender, age: u8) -> Attendee {
    Attendee::new(id, EVENT)
        .with_gender(gender)
        .with_age(age)
        .interested_in(InterestedIn::Both)
}

struct Harness {
    directory: Arc<MemoryDirectory>,
    store: Arc<MemoryStore>,
    engine: MatchEngine,
}

fn harness(attendees: Vec<Attendee>) -> Harness {
    let directory = Arc::new(MemoryDirectory::new());
    for a in attendees {
        directory.add_attendee(a);
    }
    let store = Arc::new(MemoryStore::new());
    let engine = MatchEngine::new(directory.clone(), store.clone(), MatchingPolicy::default());
    Harness { directory, store, engine }
}

async fn candidate_ids(engine: &MatchEngine, actor: &str, now: DateTime<Utc>) -> Vec<String> {
    engine
        .next_candidates(actor, EVENT, now)
        .await
        .unwrap()
        .candidates
        .into_iter()
        .map(|a| a.user_id)
        .collect()
}

#[tokio::test]
async fn test_preference_and_age_example() {
    let a = Attendee::new("a", EVENT)
        .with_gender(Gender::Man)
        .with_age(30)
        .interested_in(InterestedIn::Women)
        .with_age_range(25, 35);
    let h = harness(vec![
        a,
        attendee("b", Gender::Woman, 28),
        attendee("c", Gender::Man, 27),
        attendee("d", Gender::Woman, 40),
    ]);

    let ids = candidate_ids(&h.engine, "a", Utc::now()).await;

    assert_eq!(ids, vec!["b"]);
}

#[tokio::test]
async fn test_pass_cooldown_example() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let t0 = Utc::now();

    h.engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Pass, t0)
        .await
        .unwrap();

    assert!(candidate_ids(&h.engine, "a", t0 + Duration::hours(23)).await.is_empty());
    assert_eq!(candidate_ids(&h.engine, "a", t0 + Duration::hours(25)).await, vec!["b"]);
}

#[tokio::test]
async fn test_three_decisions_exhaust_pair() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let t0 = Utc::now();

    for day in 0..3 {
        h.engine
            .record_swipe("a", "b", EVENT, SwipeDirection::Pass, t0 + Duration::days(day * 2))
            .await
            .unwrap();
    }

    let much_later = t0 + Duration::days(365);
    let queue = h.engine.next_candidates("a", EVENT, much_later).await.unwrap();
    assert_eq!(queue.state, QueueState::Exhausted);
    assert!(queue.candidates.is_empty());

    let fourth = h
        .engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Like, much_later)
        .await;
    assert!(matches!(fourth, Err(MatchingError::InvalidSwipe(_))));
}

#[tokio::test]
async fn test_like_is_never_reshown() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let t0 = Utc::now();

    h.engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Like, t0)
        .await
        .unwrap();

    assert!(candidate_ids(&h.engine, "a", t0 + Duration::days(30)).await.is_empty());
}

#[tokio::test]
async fn test_reciprocal_likes_create_one_match_in_either_order() {
    for (first, second) in [("a", "b"), ("b", "a")] {
        let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
        let now = Utc::now();

        let one = h
            .engine
            .record_swipe(first, second, EVENT, SwipeDirection::Like, now)
            .await
            .unwrap();
        let two = h
            .engine
            .record_swipe(second, first, EVENT, SwipeDirection::Like, now)
            .await
            .unwrap();

        assert!(one.matched.is_none());
        let record = two.matched.expect("second like completes the pair");
        assert_eq!((record.user_low.as_str(), record.user_high.as_str()), ("a", "b"));
        assert_eq!(h.store.match_count(), 1);

        for user in ["a", "b"] {
            assert_eq!(h.engine.matches_for(user, EVENT).await.unwrap().len(), 1);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reciprocal_likes_race() {
    for _ in 0..50 {
        let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
        let now = Utc::now();

        let left = {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine.record_swipe("a", "b", EVENT, SwipeDirection::Like, now).await
            })
        };
        let right = {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine.record_swipe("b", "a", EVENT, SwipeDirection::Like, now).await
            })
        };

        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();

        let created = [left.matched.is_some(), right.matched.is_some()]
            .iter()
            .filter(|m| **m)
            .count();
        assert_eq!(created, 1);
        assert_eq!(h.store.match_count(), 1);
    }
}

#[tokio::test]
async fn test_undo_like_removes_match_and_reinstates_target() {
    let h = harness(vec![
        attendee("a", Gender::Man, 30),
        attendee("b", Gender::Woman, 29),
        attendee("c", Gender::Woman, 31),
    ]);
    let t0 = Utc::now();

    h.engine
        .record_swipe("b", "a", EVENT, SwipeDirection::Like, t0)
        .await
        .unwrap();
    let outcome = h
        .engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Like, t0 + Duration::seconds(10))
        .await
        .unwrap();
    assert!(outcome.matched.is_some());

    let undone = h
        .engine
        .undo_last("a", EVENT, t0 + Duration::seconds(12))
        .await
        .unwrap();

    assert!(matches!(undone, UndoOutcome::Reinstated(ref target) if target.user_id == "b"));
    assert_eq!(h.store.match_count(), 0);
    assert!(!h.store.has_like("a", "b", EVENT).await.unwrap());

    let queue = h
        .engine
        .next_candidates("a", EVENT, t0 + Duration::seconds(13))
        .await
        .unwrap();
    assert_eq!(queue.next().map(|c| c.user_id.as_str()), Some("b"));
}

#[tokio::test]
async fn test_undo_removes_match_the_partner_completed() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let t0 = Utc::now();

    let first = h
        .engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Like, t0)
        .await
        .unwrap();
    assert!(first.matched.is_none());
    let reply = h
        .engine
        .record_swipe("b", "a", EVENT, SwipeDirection::Like, t0 + Duration::seconds(1))
        .await
        .unwrap();
    assert!(reply.matched.is_some());

    let undone = h
        .engine
        .undo_last("a", EVENT, t0 + Duration::seconds(2))
        .await
        .unwrap();

    assert!(matches!(undone, UndoOutcome::Reinstated(ref target) if target.user_id == "b"));
    assert_eq!(h.store.match_count(), 0);
    for user in ["a", "b"] {
        assert!(h.engine.matches_for(user, EVENT).await.unwrap().is_empty());
    }
    assert!(!h.store.has_like("a", "b", EVENT).await.unwrap());
    assert!(h.store.has_like("b", "a", EVENT).await.unwrap());
    assert_eq!(
        candidate_ids(&h.engine, "a", t0 + Duration::seconds(3)).await,
        vec!["b"]
    );

    // Liking again re-forms the match from the partner's surviving like
    let again = h
        .engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Like, t0 + Duration::seconds(4))
        .await
        .unwrap();
    assert!(again.matched.is_some());
    assert_eq!(h.store.match_count(), 1);
}

#[tokio::test]
async fn test_undo_after_grace_or_without_swipe_mutates_nothing() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let t0 = Utc::now();

    let nothing = h.engine.undo_last("a", EVENT, t0).await.unwrap();
    assert_eq!(nothing, UndoOutcome::NothingToUndo);

    h.engine
        .record_swipe("a", "b", EVENT, SwipeDirection::Pass, t0)
        .await
        .unwrap();
    let late = h
        .engine
        .undo_last("a", EVENT, t0 + Duration::seconds(30))
        .await
        .unwrap();

    assert_eq!(late, UndoOutcome::NothingToUndo);
    assert_eq!(h.store.swipe_count().await, 1);
}

#[tokio::test]
async fn test_exclusions_hide_both_directions() {
    let h = harness(vec![
        attendee("a", Gender::Man, 30),
        attendee("b", Gender::Woman, 29),
        attendee("c", Gender::Woman, 31),
    ]);
    h.directory
        .add_exclusion(ExclusionRecord::new("b", "a", EVENT, ExclusionKind::Block));
    h.directory
        .add_exclusion(ExclusionRecord::new("a", "c", EVENT, ExclusionKind::Unmatch));
    let now = Utc::now();

    assert!(candidate_ids(&h.engine, "a", now).await.is_empty());
    assert!(!candidate_ids(&h.engine, "b", now).await.contains(&"a".to_string()));
    assert!(!candidate_ids(&h.engine, "c", now).await.contains(&"a".to_string()));
}

#[tokio::test]
async fn test_unrecognized_exclusion_kind_still_hides() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    h.directory
        .add_exclusion(ExclusionRecord::new("b", "a", EVENT, ExclusionKind::Other));
    let now = Utc::now();

    assert!(candidate_ids(&h.engine, "a", now).await.is_empty());
    assert!(candidate_ids(&h.engine, "b", now).await.is_empty());
}

#[tokio::test]
async fn test_incomplete_actor_profile() {
    let h = harness(vec![Attendee::new("a", EVENT), attendee("b", Gender::Woman, 29)]);

    let result = h.engine.next_candidates("a", EVENT, Utc::now()).await;

    assert!(matches!(result, Err(MatchingError::IncompleteProfile { .. })));
}

#[tokio::test]
async fn test_roster_change_is_observed() {
    let h = harness(vec![attendee("a", Gender::Man, 30), attendee("b", Gender::Woman, 29)]);
    let now = Utc::now();
    assert_eq!(candidate_ids(&h.engine, "a", now).await, vec!["b"]);

    h.directory.remove_attendee(EVENT, "b");

    let queue = h.engine.next_candidates("a", EVENT, now).await.unwrap();
    assert_eq!(queue.state, QueueState::NoAttendees);
}
