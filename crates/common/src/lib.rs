//! Shared runtime utilities for DirSync crates.
//!
//! - `auth`: OAuth2 client-credentials token lifecycle with singleflight
//!   refresh
//! - `resilience`: retry policy, backoff, and jitter for outbound calls
//! - `events`: secret-free event stream with bounded drop-oldest delivery
//! - `secrets`: the contract the core needs from a secret store

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod events;
pub mod resilience;
pub mod secrets;

// Re-export commonly used types for convenience
pub use auth::{TokenEndpoint, TokenManager, TokenResponse, TokenSet};
pub use events::{ApiEvent, EventSink};
pub use resilience::{BackoffStrategy, HttpRetryPolicy, Jitter, RetryDecision, RetryPolicy};
pub use secrets::{MemorySecretStore, SecretStore};
