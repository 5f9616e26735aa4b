//! Retry policy and backoff for outbound HTTP calls.
//!
//! Every individual HTTP call in the system (token requests, listing pages,
//! bulk item operations) is wrapped by one policy: retry transient failures
//! with exponential backoff, honor server-provided `Retry-After` on rate
//! limits, and surface terminal statuses immediately. Decisions are
//! deterministic given (attempt, error); the only randomness is the jitter
//! applied to the delay, bounded to a documented range.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dirsync_domain::constants::{INITIAL_BACKOFF, MAX_BACKOFF, MAX_HTTP_ATTEMPTS};
use dirsync_domain::DirSyncError;

/// Decision for whether to retry an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the policy's backoff delay
    Retry,
    /// Retry after a server-dictated delay (`Retry-After`)
    RetryAfter(Duration),
    /// Surface the error; no further attempts
    Stop,
}

/// Determines whether a failed attempt should be retried.
pub trait RetryPolicy: Send + Sync {
    /// Decide for the error produced by attempt number `attempt` (1-based).
    fn should_retry(&self, error: &DirSyncError, attempt: u32) -> RetryDecision;
}

/// Backoff strategy for calculating retry delays.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: `initial_delay * base^(attempt - 1)`, capped
    Exponential {
        /// Delay before the first retry
        initial_delay: Duration,
        /// Growth factor per attempt
        base: f64,
        /// Upper bound on any single delay
        max_delay: Duration,
    },
}

impl BackoffStrategy {
    /// Delay before the retry following attempt number `attempt` (1-based).
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = attempt.saturating_sub(1).min(16);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential { initial_delay: INITIAL_BACKOFF, base: 2.0, max_delay: MAX_BACKOFF }
    }
}

/// Jitter applied to calculated backoff delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Use the calculated delay as-is
    None,
    /// Equal jitter: uniform in `[delay/2, delay]`
    Equal,
}

impl Jitter {
    /// Apply jitter to a calculated delay.
    #[must_use]
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Self::None => delay,
            Self::Equal => {
                let half = delay.as_millis() as u64 / 2;
                Duration::from_millis(half + random_value(half.saturating_add(1)))
            }
        }
    }
}

/// Timing-seeded LCG; good enough distribution for jitter without pulling
/// in a random-number crate.
fn random_value(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or_default();
    let mut seed = nanos.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    seed % max
}

/// The retry policy applied to every outbound HTTP call.
///
/// - `Network` (transport, timeout, 5xx): retried up to the attempt ceiling
/// - `RateLimited` (429): retried honoring `Retry-After` when present
/// - `Auth`, `Validation`, `NotFound`, `Conflict`: terminal, never retried
#[derive(Debug, Clone)]
pub struct HttpRetryPolicy {
    max_attempts: u32,
}

impl HttpRetryPolicy {
    /// Policy with a custom total-attempt ceiling (minimum 1).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    /// Total attempts this policy allows per call.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for HttpRetryPolicy {
    fn default() -> Self {
        Self::new(MAX_HTTP_ATTEMPTS)
    }
}

impl RetryPolicy for HttpRetryPolicy {
    fn should_retry(&self, error: &DirSyncError, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return RetryDecision::Stop;
        }
        match error.retry_after() {
            Some(delay) => RetryDecision::RetryAfter(delay),
            None => RetryDecision::Retry,
        }
    }
}
