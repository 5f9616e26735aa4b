//! Error types for DirSync operations.
//!
//! One taxonomy for the whole core. Single-record operations surface the
//! first terminal error; bulk operations record terminal errors per item
//! and keep going (a mixed outcome is a normal job completion, not an
//! error; see `JobSummary`).

use std::time::Duration;

use thiserror::Error;

/// Core error type for DirSync operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirSyncError {
    /// Credentials rejected or token refused. Fatal, never retried.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure, timeout, or 5xx from the remote API.
    /// Retried per policy, then fatal.
    #[error("Network error: {0}")]
    Network(String),

    /// 429 from the remote API. Retried honoring `Retry-After`, then fatal.
    #[error("Rate limited by server (retry after {retry_after:?})")]
    RateLimited {
        /// Server-provided `Retry-After` delay, when parseable
        retry_after: Option<Duration>,
    },

    /// 400 with server-provided detail. Fatal.
    #[error("Validation error: {0}")]
    Validation(String),

    /// 404. Fatal for the affected item only in bulk context.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409 / uniqueness violation. Fatal for the affected item only.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invariant violation inside the core
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DirSyncError {
    /// Whether the retry policy may schedule another attempt for this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }

    /// Server-requested retry delay, if the error carries one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for DirSync operations
pub type Result<T> = std::result::Result<T, DirSyncError>;
