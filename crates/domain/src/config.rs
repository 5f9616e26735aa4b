//! Client configuration.
//!
//! All runtime knobs are explicit values scoped to one client instance.
//! There is no process-wide mutable state: a second client with different
//! settings can coexist in the same process.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CONCURRENCY, EVENT_BUFFER_CAPACITY, MAX_HTTP_ATTEMPTS, MAX_WORKERS, REQUEST_TIMEOUT,
};
use crate::errors::{DirSyncError, Result};

/// Configuration for one directory client instance.
///
/// Construct with [`ClientConfig::new`] and override individual fields with
/// the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote environment identifier (path segment in every endpoint)
    pub environment_id: String,
    /// Base URL of the token service
    pub auth_base_url: String,
    /// Base URL of the management API
    pub api_base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Total attempts per HTTP call (initial try + retries)
    pub max_attempts: u32,
    /// Default worker slots for bulk jobs (clamped to `1..=MAX_WORKERS`)
    pub concurrency: usize,
    /// Event stream buffer capacity
    pub event_capacity: usize,
}

impl ClientConfig {
    /// Create a configuration for the given environment with default
    /// endpoints and limits.
    #[must_use]
    pub fn new(environment_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            auth_base_url: "https://auth.pingone.com".to_string(),
            api_base_url: "https://api.pingone.com/v1".to_string(),
            request_timeout: REQUEST_TIMEOUT,
            max_attempts: MAX_HTTP_ATTEMPTS,
            concurrency: DEFAULT_CONCURRENCY,
            event_capacity: EVENT_BUFFER_CAPACITY,
        }
    }

    /// Override the token service base URL (no trailing slash).
    #[must_use]
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    /// Override the management API base URL (no trailing slash).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the per-call attempt ceiling.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Override the default bulk concurrency; clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_WORKERS);
        self
    }

    /// Override the event stream buffer capacity; at least 1.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`DirSyncError::Config`] when a field is empty or out of range.
    pub fn validate(&self) -> Result<()> {
        if self.environment_id.trim().is_empty() {
            return Err(DirSyncError::Config("environment_id must not be empty".into()));
        }
        if self.auth_base_url.trim().is_empty() || self.api_base_url.trim().is_empty() {
            return Err(DirSyncError::Config("base URLs must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(DirSyncError::Config("max_attempts must be greater than 0".into()));
        }
        if self.concurrency == 0 || self.concurrency > MAX_WORKERS {
            return Err(DirSyncError::Config(format!(
                "concurrency must be within 1..={MAX_WORKERS}"
            )));
        }
        Ok(())
    }
}
