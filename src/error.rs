//! Error types for the storyline engine and its interfaces.

use thiserror::Error;

/// Errors that can occur while building a corpus or extracting clusters.
#[derive(Debug, Error)]
pub enum StorylineError {
    /// The term model was queried while it was still collecting documents.
    #[error("term model queried before learning finished")]
    ModelNotReady,

    /// A document was learned after the term model was frozen.
    #[error("term model is frozen; no more documents can be learned")]
    ModelFrozen,

    /// Input snapshot could not be decoded.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation needed non-empty input.
    #[error("empty input: {0}")]
    EmptyInput(String),
}

impl From<serde_json::Error> for StorylineError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSnapshot(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorylineError>;
