use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string for the next-candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidatesQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to record a swipe decision
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordSwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: String,
    #[validate(length(min = 1))]
    pub direction: String,
}

/// Request to undo the caller's most recent swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UndoRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Query string for listing an attendee's matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchesQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}
