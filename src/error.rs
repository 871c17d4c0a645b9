use thiserror::Error;

use crate::services::{DirectoryError, StoreError};

/// Errors surfaced by the swipe and match engine
///
/// An empty candidate queue and an expired undo are outcomes, not errors.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Profile incomplete for {user_id}: gender and interest must be set")]
    IncompleteProfile { user_id: String },

    #[error("Invalid swipe: {0}")]
    InvalidSwipe(String),

    #[error("Attendee {user_id} not found in event {event_id}")]
    AttendeeNotFound { event_id: String, user_id: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl MatchingError {
    /// HTTP status the API layer reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            MatchingError::IncompleteProfile { .. } => 422,
            MatchingError::InvalidSwipe(_) => 400,
            MatchingError::AttendeeNotFound { .. } => 404,
            MatchingError::Directory(DirectoryError::EventNotFound(_)) => 404,
            MatchingError::Store(_) | MatchingError::Directory(_) => 500,
        }
    }

    /// Short machine-readable error label
    pub fn label(&self) -> &'static str {
        match self {
            MatchingError::IncompleteProfile { .. } => "incomplete_profile",
            MatchingError::InvalidSwipe(_) => "invalid_swipe",
            MatchingError::AttendeeNotFound { .. } => "attendee_not_found",
            MatchingError::Store(_) => "store_error",
            MatchingError::Directory(_) => "directory_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = MatchingError::IncompleteProfile { user_id: "u1".to_string() };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.label(), "incomplete_profile");
        assert_eq!(MatchingError::InvalidSwipe("self".into()).status_code(), 400);

        let missing = MatchingError::from(DirectoryError::EventNotFound("gala".into()));
        assert_eq!(missing.status_code(), 404);
        assert_eq!(missing.label(), "directory_error");
    }
}
