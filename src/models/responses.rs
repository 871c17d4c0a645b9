use serde::{Deserialize, Serialize};
use crate::models::domain::{Attendee, MatchRecord, QueueState, SwipeDecision};

/// Response for the next-candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub state: QueueState,
    pub candidates: Vec<Attendee>,
    pub total: usize,
}

/// Response for a recorded swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSwipeResponse {
    pub swipe: SwipeDecision,
    #[serde(rename = "match")]
    pub matched: Option<MatchRecord>,
}

/// Response for an undo request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub undone: bool,
    pub candidate: Option<Attendee>,
}

/// Matches the caller is part of, with the partner id resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "matchId")]
    pub match_id: uuid::Uuid,
    #[serde(rename = "partnerId")]
    pub partner_id: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
