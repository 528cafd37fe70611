//! Error types for opguard.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the safety subsystem.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    // Preview errors
    #[error("Preview generation failed: {0}")]
    PreviewFailed(String),

    // Checkpoint errors
    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    #[error("Invalid checkpoint metadata: {0}")]
    InvalidCheckpoint(String),

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // Orchestrator errors
    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("Invalid state transition: operation {id} is {status}, cannot {action}")]
    InvalidState {
        id: String,
        status: String,
        action: String,
    },

    #[error("Operation {0} has no checkpoint to roll back to")]
    NoCheckpoint(String),

    // Config errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
