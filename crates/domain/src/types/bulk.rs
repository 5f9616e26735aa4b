//! Bulk job types.
//!
//! A bulk job is a batch of independent per-item operations executed by the
//! scheduler under one concurrency bound, with exactly one [`ItemResult`]
//! recorded per submitted item, under success, failure, and cancellation
//! alike.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_WORKERS;
use crate::types::record::{Record, UsernameIndex};

/// Kind of per-item operation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// POST a new entity
    Create,
    /// PATCH an existing entity with a delta
    Update,
    /// DELETE an entity by id
    Delete,
}

/// Stable reference attributing a result to its originating item.
///
/// Carries the submission index plus a human-readable label (username or
/// id); completion order is not dispatch order, so results are never
/// attributed positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Zero-based position in the submitted item sequence
    pub index: usize,
    /// Username or id identifying the item to a human
    pub label: String,
}

/// Payload of one bulk item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    /// Create a new entity from a full record
    Create(Record),
    /// Patch an existing entity
    Update {
        /// Remote id of the entity
        id: String,
        /// Delta patch body
        patch: Record,
    },
    /// Delete an entity
    Delete {
        /// Remote id of the entity
        id: String,
    },
}

/// One unit of work in a bulk job.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    /// Stable reference carried through to the result
    pub item_ref: ItemRef,
    /// The operation to perform
    pub payload: ItemPayload,
}

/// Terminal state of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The remote operation succeeded
    Succeeded,
    /// The remote operation failed with a human-readable reason
    Failed {
        /// Why the item failed
        reason: String,
    },
    /// The item was never dispatched because the job was canceled
    Canceled,
}

/// Recorded outcome of one item; appended exactly once per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// Which item this outcome belongs to
    pub item_ref: ItemRef,
    /// What happened
    pub outcome: ItemOutcome,
}

/// Job lifecycle: `Queued → Running → {Completed, Canceled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, not yet picked up by the supervisor
    Queued,
    /// Items are being dispatched
    Running,
    /// All items reached a terminal state without cancellation
    Completed,
    /// Canceled by the caller or stopped early (no valid token obtainable)
    Canceled,
}

/// Structured outcome summary of a finished job.
///
/// A job with both successes and failures is a normal completion, never an
/// error value; the per-item detail lives in `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job identifier
    pub job_id: Uuid,
    /// Terminal status (`Completed` or `Canceled`)
    pub status: JobStatus,
    /// Items that succeeded
    pub succeeded: usize,
    /// Items that failed terminally
    pub failed: usize,
    /// Items never dispatched due to cancellation
    pub canceled: usize,
    /// One entry per submitted item
    pub results: Vec<ItemResult>,
}

/// A batch of per-item operations plus its execution settings.
#[derive(Debug, Clone)]
pub struct BulkJob {
    /// Job identifier
    pub job_id: Uuid,
    /// What kind of operation the items perform
    pub kind: OperationKind,
    /// Items in submission order
    pub items: Vec<BulkItem>,
    /// Per-job worker-slot override (clamped to `1..=MAX_WORKERS`); `None`
    /// uses the scheduler's configured default
    pub concurrency: Option<usize>,
    /// Existing usernames for create-job duplicate avoidance
    pub existing: UsernameIndex,
}

impl BulkJob {
    /// Build an import (create) job.
    ///
    /// `existing` maps normalized usernames to remote ids; matches are
    /// rewritten to updates at dispatch time instead of creating duplicates.
    #[must_use]
    pub fn create(records: Vec<Record>, existing: UsernameIndex) -> Self {
        let items = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let label = record
                    .username()
                    .or_else(|| record.id())
                    .unwrap_or("<unknown>")
                    .to_string();
                BulkItem { item_ref: ItemRef { index, label }, payload: ItemPayload::Create(record) }
            })
            .collect();
        Self {
            job_id: Uuid::new_v4(),
            kind: OperationKind::Create,
            items,
            concurrency: None,
            existing,
        }
    }

    /// Build an update job from (id, patch) pairs.
    #[must_use]
    pub fn update(pairs: Vec<(String, Record)>) -> Self {
        let items = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (id, patch))| BulkItem {
                item_ref: ItemRef { index, label: id.clone() },
                payload: ItemPayload::Update { id, patch },
            })
            .collect();
        Self {
            job_id: Uuid::new_v4(),
            kind: OperationKind::Update,
            items,
            concurrency: None,
            existing: UsernameIndex::new(),
        }
    }

    /// Build a delete job from remote ids.
    #[must_use]
    pub fn delete(ids: Vec<String>) -> Self {
        let items = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| BulkItem {
                item_ref: ItemRef { index, label: id.clone() },
                payload: ItemPayload::Delete { id },
            })
            .collect();
        Self {
            job_id: Uuid::new_v4(),
            kind: OperationKind::Delete,
            items,
            concurrency: None,
            existing: UsernameIndex::new(),
        }
    }

    /// Override this job's concurrency limit; clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.clamp(1, MAX_WORKERS));
        self
    }

    /// Number of submitted items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }
}
