// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeRange, Attendee, CandidateQueue, CanonicalPair, EventStatus, EventWindow, ExclusionKind,
    ExclusionRecord, Gender, InterestedIn, MatchRecord, MatchingPolicy, QueueState, SwipeDecision,
    SwipeDirection, SwipeOutcome, UndoOutcome, WindowPhase,
};
pub use requests::{CandidatesQuery, MatchesQuery, RecordSwipeRequest, UndoRequest};
pub use responses::{
    CandidatesResponse, ErrorResponse, HealthResponse, MatchSummary, MatchesResponse,
    RecordSwipeResponse, UndoResponse,
};
