//! Content store error types.

use std::time::Duration;

/// Errors from [`ContentStore`](crate::ContentStore) backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object exists for the identifier, or the node could not resolve it.
    #[error("content {0} not found")]
    NotFound(String),

    /// The call did not complete within its client-side deadline.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        /// Operation that timed out (`put` or `get`).
        operation: &'static str,
        /// Deadline that was exceeded.
        elapsed: Duration,
    },

    /// The backend could not be reached.
    #[error("storage transport error during {operation}: {reason}")]
    Transport {
        /// Operation in progress.
        operation: &'static str,
        /// Underlying failure.
        reason: String,
    },

    /// The backend answered with an unexpected status.
    #[error("storage backend returned {status} during {operation}: {body}")]
    Upstream {
        /// Operation in progress.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// The backend answered with a body that could not be interpreted.
    #[error("invalid storage response: {0}")]
    InvalidResponse(String),

    /// Stored bytes no longer match their identifier.
    #[error("integrity check failed for {0}")]
    Integrity(String),

    /// Local filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the object is missing or unresolvable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
