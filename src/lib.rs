//! Mingle - per-event swipe and match engine
//!
//! Guests of the same event browse each other's profiles and mutually like to
//! unlock a chat. This library decides who to show next, records swipe
//! decisions, creates exactly one match per reciprocal pair and supports a
//! short undo of the last decision.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CandidateFilter, MatchDetector, MatchEngine, SwipeRecorder, UndoCoordinator};
pub use error::MatchingError;
pub use models::{
    Attendee, CandidateQueue, MatchRecord, MatchingPolicy, QueueState, SwipeDecision,
    SwipeDirection, SwipeOutcome, UndoOutcome,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let policy = MatchingPolicy::default();
        let filter = CandidateFilter::new(policy);
        assert_eq!(filter.policy().max_decisions_per_pair, 3);
    }
}
