use thiserror::Error;

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid slot: {0}")]
    InvalidSlot(String),

    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
