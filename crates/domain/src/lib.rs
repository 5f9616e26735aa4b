//! # DirSync Domain
//!
//! Business domain types and models for DirSync.
//!
//! This crate contains:
//! - Domain data types (Record, Population, bulk job types)
//! - Domain error types and Result definitions
//! - Client configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other DirSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::ClientConfig;
pub use errors::{DirSyncError, Result};
pub use types::bulk::{
    BulkItem, BulkJob, ItemOutcome, ItemPayload, ItemRef, ItemResult, JobStatus, JobSummary,
    OperationKind,
};
pub use types::credentials::Credentials;
pub use types::population::{Population, PopulationMap};
pub use types::record::{normalize_username, Record, UsernameIndex};
