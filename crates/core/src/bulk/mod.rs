//! Bounded worker-pool execution of bulk jobs.
//!
//! The scheduler dispatches a job's items in submission order through a
//! semaphore-bounded pool, records exactly one outcome per item, and
//! supports cooperative cancellation: in-flight operations run to
//! completion, undispatched items are marked canceled.

mod handle;
mod scheduler;

pub use handle::JobHandle;
pub use scheduler::BulkScheduler;
