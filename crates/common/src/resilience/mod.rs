//! Resilience primitives for outbound calls.

mod retry;

pub use retry::{BackoffStrategy, HttpRetryPolicy, Jitter, RetryDecision, RetryPolicy};
