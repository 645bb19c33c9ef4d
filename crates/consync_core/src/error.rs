//! Application error types for core parsing and domain logic.
use thiserror::Error;

/// Top-level error type for the core engine.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid resource reference: {0}")]
    InvalidResourceRef(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
