// Core engine exports
pub mod candidates;
pub mod detector;
pub mod engine;
pub mod filters;
pub mod recorder;
pub mod undo;

pub use candidates::CandidateFilter;
pub use detector::MatchDetector;
pub use engine::MatchEngine;
pub use filters::{matches_preference, reshow_verdict, within_age_range, ReshowVerdict};
pub use recorder::SwipeRecorder;
pub use undo::{UndoCoordinator, UndoState};
