//! Error types for the durable store.

use tabkeep_core::LifecycleError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Filesystem error while opening the database.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking database task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A required field was missing; nothing was written.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidData(msg) => Self::InvalidData(msg),
            StoreError::Serde(e) => Self::InvalidData(e.to_string()),
            other => Self::TransientIo(other.to_string()),
        }
    }
}
