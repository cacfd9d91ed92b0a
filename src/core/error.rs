//! Error types for the leveling engine.

use crate::progression::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevelingError {
    /// Invalid formula or configuration. Raised at construction so the engine
    /// never starts with a broken curve.
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller broke an operation's contract (e.g. removing zero levels).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("expression evaluation failed: {0}")]
    Evaluation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LevelingError {
    pub fn config(msg: impl Into<String>) -> Self {
        LevelingError::Config(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        LevelingError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LevelingError>;
