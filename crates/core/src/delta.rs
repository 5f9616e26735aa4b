//! Minimal-diff patch computation.
//!
//! Pure value comparison over flattened records; no I/O, no side effects.

use dirsync_domain::Record;
use serde_json::Value;

/// Compute the delta patch turning `original` into `edited`.
///
/// An attribute path present in `edited` is included iff its value differs
/// from `original` (missing in `original` counts as different). Attributes
/// removed in `edited` relative to `original` are assigned an explicit
/// `null` (the API's removal convention) rather than being omitted, so the
/// server applies the removal.
///
/// `compute_patch(x, x)` is the empty record.
#[must_use]
pub fn compute_patch(original: &Record, edited: &Record) -> Record {
    let mut patch = Record::new();

    for (path, value) in edited.iter() {
        match original.get(path) {
            Some(previous) if previous == value => {}
            _ => patch.set(path.clone(), value.clone()),
        }
    }

    for (path, _) in original.iter() {
        if !edited.contains(path) {
            patch.set(path.clone(), Value::Null);
        }
    }

    patch
}
