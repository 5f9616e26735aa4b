//! Caller-side view of a running bulk job.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use dirsync_domain::{DirSyncError, JobStatus, JobSummary, Result};

const STATUS_QUEUED: u8 = 0;
const STATUS_RUNNING: u8 = 1;
const STATUS_COMPLETED: u8 = 2;
const STATUS_CANCELED: u8 = 3;

/// Shared job state, updated by workers and read by the handle.
#[derive(Debug)]
pub(crate) struct JobState {
    pub(crate) job_id: Uuid,
    pub(crate) total: usize,
    pub(crate) completed: AtomicUsize,
    status: AtomicU8,
    pub(crate) cancel: CancellationToken,
}

impl JobState {
    pub(crate) fn new(job_id: Uuid, total: usize) -> Self {
        Self {
            job_id,
            total,
            completed: AtomicUsize::new(0),
            status: AtomicU8::new(STATUS_QUEUED),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn set_status(&self, status: JobStatus) {
        let raw = match status {
            JobStatus::Queued => STATUS_QUEUED,
            JobStatus::Running => STATUS_RUNNING,
            JobStatus::Completed => STATUS_COMPLETED,
            JobStatus::Canceled => STATUS_CANCELED,
        };
        self.status.store(raw, Ordering::SeqCst);
    }

    pub(crate) fn status(&self) -> JobStatus {
        match self.status.load(Ordering::SeqCst) {
            STATUS_RUNNING => JobStatus::Running,
            STATUS_COMPLETED => JobStatus::Completed,
            STATUS_CANCELED => JobStatus::Canceled,
            _ => JobStatus::Queued,
        }
    }
}

/// Handle to a submitted bulk job.
///
/// Cheap to poll for progress; consumed by [`JobHandle::wait`] to obtain
/// the final [`JobSummary`].
#[derive(Debug)]
pub struct JobHandle {
    state: Arc<JobState>,
    summary_rx: oneshot::Receiver<JobSummary>,
}

impl JobHandle {
    pub(crate) fn new(state: Arc<JobState>, summary_rx: oneshot::Receiver<JobSummary>) -> Self {
        Self { state, summary_rx }
    }

    /// Identifier of the job.
    #[must_use]
    pub fn job_id(&self) -> Uuid {
        self.state.job_id
    }

    /// `(items in a terminal state, items submitted)`.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.state.completed.load(Ordering::SeqCst), self.state.total)
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Request cancellation. In-flight items run to completion; items not
    /// yet dispatched are recorded as canceled. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }

    /// Wait for the job to finish and take its summary.
    pub async fn wait(self) -> Result<JobSummary> {
        self.summary_rx
            .await
            .map_err(|_| DirSyncError::Internal("bulk job supervisor dropped".into()))
    }
}
