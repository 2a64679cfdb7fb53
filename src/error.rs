//! Error kinds surfaced by the reading session.
//!
//! The matching engine never fails while processing speech; these errors only
//! come from user commands and from the recognizer boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadingError {
    /// User tried to load blank text.
    #[error("Please enter some text first!")]
    EmptyInput,
    /// A command that needs loaded text arrived before any text was loaded.
    #[error("No text loaded")]
    NothingLoaded,
    /// The host platform has no speech recognizer.
    #[error("Your browser does not support speech recognition. Please use Chrome or Edge.")]
    RecognitionUnavailable,
    /// Network or no-speech class error, retried automatically.
    #[error("recognition interrupted ({code}), retrying")]
    RecognitionTransient { code: String },
    /// Any other recognizer error, halts the session.
    #[error("Error: {code}")]
    RecognitionFatal { code: String },
}

impl ReadingError {
    /// Whether the session keeps running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReadingError::RecognitionFatal { .. } | ReadingError::RecognitionUnavailable)
    }
}
