//! # DirSync Core
//!
//! Use-case layer of the directory sync engine:
//! - `ports`: the directory API surface the engine drives (implemented by
//!   the infra crate, mocked in tests)
//! - `delta`: minimal-diff patch computation between record snapshots
//! - `bulk`: the bounded worker-pool scheduler for bulk create/update/delete
//!   jobs with progress, cancellation, and per-item outcome tracking

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod bulk;
pub mod delta;
pub mod ports;

pub use bulk::{BulkScheduler, JobHandle};
pub use delta::compute_patch;
pub use ports::DirectoryOps;
