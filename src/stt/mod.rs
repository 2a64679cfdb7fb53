//! Speech recognition boundary.
//!
//! Turns recognizer results into matcher hypotheses and manages the
//! recognition lifecycle (start, auto-restart, retry, stop).

mod hypothesis;
mod recognizer;

pub use hypothesis::{Alternative, RecognitionBatch, RecognitionResult};
pub use recognizer::{DEFAULT_RETRY_DELAY, RecognitionController, RecognitionPhase, RecognizerCommand};
