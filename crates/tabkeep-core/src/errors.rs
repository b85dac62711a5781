//! Error taxonomy for the tab lifecycle core.
//!
//! Every failure inside the core falls into one of three classes:
//!
//! - [`LifecycleError::TransientIo`]: a durable-store or host call failed.
//!   The affected item is abandoned and picked up again on the next sweep
//!   or event.
//! - [`LifecycleError::StaleReference`]: a tab or bookmark referenced by id
//!   is gone. Handled by cleanup, never surfaced to the user.
//! - [`LifecycleError::InvalidData`]: a required field is missing. The
//!   operation becomes a no-op with no partial write.
//!
//! None of them is fatal: event handlers and the sweep timer keep running.

use thiserror::Error;

/// Classified failure of a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A durable-store or host-API call failed.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    /// A referenced tab or bookmark no longer exists.
    #[error("stale reference: {0}")]
    StaleReference(String),

    /// A required field was missing or empty.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl LifecycleError {
    /// Whether retrying later can succeed without any change in input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }

    /// Short machine-readable class name, used as a log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransientIo(_) => "transient_io",
            Self::StaleReference(_) => "stale_reference",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}
