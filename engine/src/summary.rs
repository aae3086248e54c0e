//! Sync summaries handed to the presentation layer.
//!
//! A summary lists what actually happened in a run. Per-record failures are
//! kept next to the successes so a partial run is never reported as complete.

use crate::{Conflict, ContactRecord, ReconciliationResult, SkippedDuplicate};
use serde::{Deserialize, Serialize};

/// The operation a summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncMode {
    Full,
    ImportOnly,
    ExportSelected,
    ResolveConflicts,
}

/// A record that could not be written, with a description of why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    pub record: ContactRecord,
    pub error: String,
}

impl RecordFailure {
    pub fn new(record: ContactRecord, error: impl ToString) -> Self {
        Self {
            record,
            error: error.to_string(),
        }
    }
}

/// Counts derived from a [`SyncSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub imported: usize,
    pub exported: usize,
    pub updated: usize,
    pub conflicting: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped_duplicates: usize,
    pub unmatched: usize,
}

/// Outcome of one sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub mode: SyncMode,
    /// Records added to the local store
    pub imported: Vec<ContactRecord>,
    /// Records created in the remote directory (local copies, now linked)
    pub exported: Vec<ContactRecord>,
    /// Local records overwritten during conflict resolution
    pub updated: Vec<ContactRecord>,
    /// Conflicts still awaiting a decision
    pub conflicts: Vec<Conflict>,
    pub unchanged: usize,
    pub unmatched_local: usize,
    pub unmatched_remote: usize,
    pub orphaned: usize,
    pub skipped_duplicates: Vec<SkippedDuplicate>,
    pub import_failures: Vec<RecordFailure>,
    pub export_failures: Vec<RecordFailure>,
    /// The run was cancelled before every planned write was attempted
    pub cancelled: bool,
    /// A store failure stopped the run; writes listed above still happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl SyncSummary {
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            imported: Vec::new(),
            exported: Vec::new(),
            updated: Vec::new(),
            conflicts: Vec::new(),
            unchanged: 0,
            unmatched_local: 0,
            unmatched_remote: 0,
            orphaned: 0,
            skipped_duplicates: Vec::new(),
            import_failures: Vec::new(),
            export_failures: Vec::new(),
            cancelled: false,
            aborted: None,
        }
    }

    /// Start a summary from a reconciliation, before anything is applied.
    pub fn from_reconciliation(mode: SyncMode, result: &ReconciliationResult) -> Self {
        Self {
            conflicts: result.conflicts.clone(),
            unchanged: result.unchanged,
            unmatched_local: result.unmatched_local,
            unmatched_remote: result.unmatched_remote,
            orphaned: result.orphaned,
            skipped_duplicates: result.skipped_duplicates.clone(),
            ..Self::new(mode)
        }
    }

    /// True only when every attempted write succeeded, nothing was skipped
    /// and the run ran to the end.
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.aborted.is_none()
            && self.import_failures.is_empty()
            && self.export_failures.is_empty()
            && self.skipped_duplicates.is_empty()
    }

    pub fn counts(&self) -> SyncCounts {
        SyncCounts {
            imported: self.imported.len(),
            exported: self.exported.len(),
            updated: self.updated.len(),
            conflicting: self.conflicts.len(),
            unchanged: self.unchanged,
            failed: self.import_failures.len() + self.export_failures.len(),
            skipped_duplicates: self.skipped_duplicates.len(),
            unmatched: self.unmatched_local + self.unmatched_remote,
        }
    }
}
