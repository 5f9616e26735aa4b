//! Domain constants shared across DirSync crates.
//!
//! Thresholds the remote API documentation only describes qualitatively are
//! pinned here to explicit values so behavior is deterministic and testable.

use std::time::Duration;

/// Refresh the cached token this many seconds before its expiry.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 30;

/// Fixed timeout applied to every outbound HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Total attempts per HTTP call (initial try + retries).
pub const MAX_HTTP_ATTEMPTS: u32 = 3;

/// First backoff delay after a retryable failure.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Backoff delays are capped here regardless of attempt count.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Hard upper bound on bulk worker slots, protecting the remote API.
pub const MAX_WORKERS: usize = 8;

/// Worker slots used when a job does not specify a concurrency limit.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Pagination hard stop: a listing walk never follows more pages than this.
pub const MAX_PAGES: usize = 10_000;

/// Bounded event-stream capacity; overflow drops the oldest events.
pub const EVENT_BUFFER_CAPACITY: usize = 256;
