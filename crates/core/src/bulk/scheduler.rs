//! Bulk job supervisor and worker pool.

use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, info, warn};

use dirsync_common::{ApiEvent, EventSink};
use dirsync_domain::constants::{DEFAULT_CONCURRENCY, MAX_WORKERS};
use dirsync_domain::{
    BulkItem, BulkJob, DirSyncError, ItemOutcome, ItemPayload, ItemResult, JobStatus, JobSummary,
    OperationKind, Result,
};

use crate::bulk::handle::{JobHandle, JobState};
use crate::ports::DirectoryOps;

/// Executes bulk jobs against a [`DirectoryOps`] implementation.
///
/// Each submitted job gets its own supervisor task and semaphore-bounded
/// worker pool; the scheduler itself holds no per-job state and is cheap
/// to clone.
#[derive(Clone)]
pub struct BulkScheduler {
    ops: Arc<dyn DirectoryOps>,
    events: EventSink,
    default_concurrency: usize,
}

impl BulkScheduler {
    /// New scheduler over the given directory port.
    #[must_use]
    pub fn new(ops: Arc<dyn DirectoryOps>, events: EventSink) -> Self {
        Self { ops, events, default_concurrency: DEFAULT_CONCURRENCY }
    }

    /// Override the worker-slot count used for jobs without their own
    /// concurrency setting; clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn with_default_concurrency(mut self, concurrency: usize) -> Self {
        self.default_concurrency = concurrency.clamp(1, MAX_WORKERS);
        self
    }

    /// Submit a job for execution; returns immediately with a handle.
    #[must_use]
    pub fn submit(&self, job: BulkJob) -> JobHandle {
        let state = Arc::new(JobState::new(job.job_id, job.total()));
        let (summary_tx, summary_rx) = oneshot::channel();

        let supervisor = Supervisor {
            ops: Arc::clone(&self.ops),
            events: self.events.clone(),
            state: Arc::clone(&state),
            concurrency: job.concurrency.unwrap_or(self.default_concurrency),
        };
        tokio::spawn(async move {
            let summary = supervisor.run(job).await;
            let _ = summary_tx.send(summary);
        });

        JobHandle::new(state, summary_rx)
    }
}

/// One item after the pre-dispatch pass: either work to hand a worker, or
/// an outcome decided without touching the remote API.
enum Prepared {
    Dispatch(BulkItem),
    Settled(ItemResult),
}

struct Supervisor {
    ops: Arc<dyn DirectoryOps>,
    events: EventSink,
    state: Arc<JobState>,
    concurrency: usize,
}

impl Supervisor {
    async fn run(self, job: BulkJob) -> JobSummary {
        let job_id = job.job_id;
        let total = job.total();
        let concurrency = self.concurrency;
        self.state.set_status(JobStatus::Running);
        info!(%job_id, ?job.kind, total, concurrency, "bulk job started");

        let prepared = prepare(&job);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<ItemResult>();
        let mut results: Vec<ItemResult> = Vec::with_capacity(total);

        for entry in prepared {
            let item = match entry {
                Prepared::Settled(result) => {
                    self.record(&result);
                    results.push(result);
                    continue;
                }
                Prepared::Dispatch(item) => item,
            };

            if self.state.cancel.is_cancelled() {
                let result = canceled(item);
                self.record(&result);
                results.push(result);
                continue;
            }

            // Blocks until a worker slot frees up, so items are dispatched
            // in submission order with at most `concurrency` in flight.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let result = canceled(item);
                    self.record(&result);
                    results.push(result);
                    continue;
                }
            };

            // Cancellation may have arrived while waiting for the slot.
            if self.state.cancel.is_cancelled() {
                drop(permit);
                let result = canceled(item);
                self.record(&result);
                results.push(result);
                continue;
            }

            let ops = Arc::clone(&self.ops);
            let state = Arc::clone(&self.state);
            let events = self.events.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = match execute(ops.as_ref(), &item.payload).await {
                    Ok(()) => ItemOutcome::Succeeded,
                    Err(error) => {
                        if matches!(error, DirSyncError::Auth(_)) {
                            warn!(job_id = %state.job_id, "authentication failed, stopping job");
                            state.cancel.cancel();
                        }
                        ItemOutcome::Failed { reason: error.to_string() }
                    }
                };
                let result = ItemResult { item_ref: item.item_ref, outcome };
                record_terminal(&state, &events, &result);
                let _ = tx.send(result);
                drop(permit);
            });
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results.sort_by_key(|r| r.item_ref.index);

        let status = if self.state.cancel.is_cancelled() {
            JobStatus::Canceled
        } else {
            JobStatus::Completed
        };
        self.state.set_status(status);

        let summary = summarize(job_id, status, results);
        info!(
            %job_id,
            ?status,
            succeeded = summary.succeeded,
            failed = summary.failed,
            canceled = summary.canceled,
            "bulk job finished"
        );
        summary
    }

    fn record(&self, result: &ItemResult) {
        record_terminal(&self.state, &self.events, result);
    }
}

/// Pre-dispatch pass over a job's items.
///
/// For create jobs this is where duplicate avoidance happens: a create
/// whose normalized username already exists remotely is rewritten into an
/// update against the existing id, and a username repeated within the
/// batch fails every occurrence after the first.
fn prepare(job: &BulkJob) -> Vec<Prepared> {
    let mut seen = BTreeSet::new();
    job.items
        .iter()
        .map(|item| {
            if job.kind != OperationKind::Create {
                return Prepared::Dispatch(item.clone());
            }
            let ItemPayload::Create(record) = &item.payload else {
                return Prepared::Dispatch(item.clone());
            };
            let Some(username) = record.normalized_username() else {
                return Prepared::Dispatch(item.clone());
            };
            if !seen.insert(username.clone()) {
                debug!(label = %item.item_ref.label, "duplicate username within batch");
                return Prepared::Settled(ItemResult {
                    item_ref: item.item_ref.clone(),
                    outcome: ItemOutcome::Failed {
                        reason: DirSyncError::Conflict(format!(
                            "duplicate username in batch: {username}"
                        ))
                        .to_string(),
                    },
                });
            }
            if let Some(id) = job.existing.lookup(&username) {
                debug!(label = %item.item_ref.label, id, "username exists, rewriting to update");
                return Prepared::Dispatch(BulkItem {
                    item_ref: item.item_ref.clone(),
                    payload: ItemPayload::Update { id: id.to_string(), patch: record.clone() },
                });
            }
            Prepared::Dispatch(item.clone())
        })
        .collect()
}

async fn execute(ops: &dyn DirectoryOps, payload: &ItemPayload) -> Result<()> {
    match payload {
        ItemPayload::Create(record) => ops.create_user(record).await.map(|_| ()),
        ItemPayload::Update { id, patch } => ops.update_user(id, patch).await.map(|_| ()),
        ItemPayload::Delete { id } => ops.delete_user(id).await,
    }
}

fn canceled(item: BulkItem) -> ItemResult {
    ItemResult { item_ref: item.item_ref, outcome: ItemOutcome::Canceled }
}

fn record_terminal(state: &JobState, events: &EventSink, result: &ItemResult) {
    let completed = state.completed.fetch_add(1, Ordering::SeqCst) + 1;
    events.emit(ApiEvent::Item { job_id: state.job_id, result: result.clone() });
    events.emit(ApiEvent::JobProgress { job_id: state.job_id, completed, total: state.total });
}

fn summarize(job_id: uuid::Uuid, status: JobStatus, results: Vec<ItemResult>) -> JobSummary {
    let mut succeeded = 0;
    let mut failed = 0;
    let mut canceled = 0;
    for result in &results {
        match result.outcome {
            ItemOutcome::Succeeded => succeeded += 1,
            ItemOutcome::Failed { .. } => failed += 1,
            ItemOutcome::Canceled => canceled += 1,
        }
    }
    JobSummary { job_id, status, succeeded, failed, canceled, results }
}
