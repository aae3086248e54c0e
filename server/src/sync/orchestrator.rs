//! Sync orchestration: fetch, reconcile, then apply the delta to both sides.

use super::paginator;
use super::session::SyncSession;
use crate::directory::RemoteDirectory;
use crate::error::{AppError, Result};
use crate::now_millis;
use crate::store::ContactStore;
use futures::stream::{self, StreamExt};
use rolodex_engine::{
    identity, normalize, resolve, Conflict, ContactPatch, ContactRecord, Decisions, Error,
    Reconciler, RecordFailure, Resolution, SyncMode, SyncSummary,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Tunables for applying a delta.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    /// Maximum concurrent remote create calls
    pub export_concurrency: usize,
    /// Push locally-kept conflict winners to the directory
    pub push_local_winners: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            export_concurrency: 4,
            push_local_winners: false,
        }
    }
}

enum ExportOutcome {
    Exported(ContactRecord),
    Failed(RecordFailure),
    NotAttempted,
}

/// Drives sync operations for one local store and one remote directory.
///
/// Only one operation runs at a time; an overlapping call fails with
/// `SyncInProgress`. Writes already made stay in place when an operation is
/// cancelled or aborted.
pub struct SyncOrchestrator {
    store: Arc<dyn ContactStore>,
    directory: Arc<dyn RemoteDirectory>,
    reconciler: Reconciler,
    settings: SyncSettings,
    session: SyncSession,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn ContactStore>,
        directory: Arc<dyn RemoteDirectory>,
        reconciler: Reconciler,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            directory,
            reconciler,
            settings,
            session: SyncSession::new(),
        }
    }

    /// Import everything new remotely, export everything new locally, and
    /// register the conflicts for resolution.
    pub async fn full_sync(&self) -> Result<SyncSummary> {
        self.reconcile_and_apply(SyncMode::Full).await
    }

    /// Like [`Self::full_sync`] but nothing is exported.
    pub async fn import_only(&self) -> Result<SyncSummary> {
        self.reconcile_and_apply(SyncMode::ImportOnly).await
    }

    /// Create the given local records remotely, without reconciling first.
    pub async fn export_selected(&self, records: Vec<ContactRecord>) -> Result<SyncSummary> {
        let run = self.session.begin()?;
        tracing::info!(count = records.len(), "Exporting selected contacts");

        let mut summary = SyncSummary::new(SyncMode::ExportSelected);
        self.apply_exports(records, &run.cancel, &mut summary).await;

        log_summary(&summary);
        Ok(summary)
    }

    /// Apply a decision for every outstanding conflict.
    pub async fn resolve_conflicts(&self, decisions: &Decisions) -> Result<SyncSummary> {
        let mut run = self.session.begin()?;
        let conflicts = run.state.conflicts();
        let writes = resolve(&conflicts, decisions, now_millis())?;
        tracing::info!(
            conflicts = conflicts.len(),
            remote_wins = writes.len(),
            "Resolving conflicts"
        );

        let mut summary = SyncSummary::new(SyncMode::ResolveConflicts);
        let mut settled = Vec::new();

        for record in writes {
            if run.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let key = identity::key(&record);
            match self.store.update(&record.id, ContactPatch::adopt(&record)).await {
                Ok(updated) => {
                    summary.updated.push(updated);
                    settled.extend(key);
                }
                Err(AppError::Engine(e)) if !e.is_sync_aborting() => {
                    tracing::warn!(id = %record.id, error = %e, "Could not adopt remote copy");
                    summary.import_failures.push(RecordFailure::new(record, e));
                }
                Err(e) => {
                    tracing::error!(id = %record.id, error = %e, "Store failed, stopping resolution");
                    summary.aborted = Some(e.to_string());
                    break;
                }
            }
        }

        let local_wins = conflicts
            .iter()
            .filter(|c| decisions.get(&c.key) == Some(&Resolution::Local));
        for conflict in local_wins {
            if summary.aborted.is_some() {
                break;
            }
            if self.settings.push_local_winners {
                if run.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
                self.push_local_winner(conflict, &mut summary).await;
            }
            settled.push(conflict.key.clone());
        }

        run.state.settle(&settled);
        summary.conflicts = run.state.conflicts();

        log_summary(&summary);
        Ok(summary)
    }

    /// Conflicts registered by the last full or import-only run and not yet
    /// settled.
    pub fn outstanding_conflicts(&self) -> Result<Vec<Conflict>> {
        Ok(self.session.outstanding()?)
    }

    /// Ask the running operation to stop at its next checkpoint.
    pub fn cancel(&self) -> bool {
        let running = self.session.cancel();
        if running {
            tracing::info!("Cancellation requested");
        }
        running
    }

    async fn reconcile_and_apply(&self, mode: SyncMode) -> Result<SyncSummary> {
        let mut run = self.session.begin()?;
        tracing::info!(?mode, "Starting sync");

        let remote = paginator::fetch_all(self.directory.as_ref(), &run.cancel, now_millis()).await?;
        let local = self.store.list().await?;
        let result = self.reconciler.reconcile(&local, &remote)?;
        tracing::debug!(
            local = local.len(),
            remote = remote.len(),
            to_import = result.to_import.len(),
            to_export = result.to_export.len(),
            conflicts = result.conflicts.len(),
            "Reconciled"
        );

        run.state.replace_conflicts(result.conflicts.clone());
        let mut summary = SyncSummary::from_reconciliation(mode, &result);

        self.apply_imports(result.to_import, &run.cancel, &mut summary)
            .await;
        if mode == SyncMode::Full && summary.aborted.is_none() {
            self.apply_exports(result.to_export, &run.cancel, &mut summary)
                .await;
        }

        log_summary(&summary);
        Ok(summary)
    }

    /// Add imports one at a time. A duplicate phone fails only that record;
    /// any other store error stops the batch and marks the summary aborted.
    async fn apply_imports(
        &self,
        records: Vec<ContactRecord>,
        cancel: &CancellationToken,
        summary: &mut SyncSummary,
    ) {
        for record in records {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            match self.store.add(record.clone()).await {
                Ok(stored) => summary.imported.push(stored),
                Err(AppError::Engine(e @ Error::DuplicatePhone(_))) => {
                    tracing::warn!(phone = %record.phone, error = %e, "Import failed");
                    summary.import_failures.push(RecordFailure::new(record, e));
                }
                Err(e) => {
                    tracing::error!(phone = %record.phone, error = %e, "Store failed, stopping imports");
                    summary.aborted = Some(e.to_string());
                    break;
                }
            }
        }
    }

    /// Fan exports out with bounded concurrency. Results keep input order.
    async fn apply_exports(
        &self,
        records: Vec<ContactRecord>,
        cancel: &CancellationToken,
        summary: &mut SyncSummary,
    ) {
        let limit = self.settings.export_concurrency.max(1);
        let store = self.store.clone();
        let directory = self.directory.clone();
        let cancel = cancel.clone();

        let outcomes: Vec<ExportOutcome> = stream::iter(records)
            .map(move |record| export_one(store.clone(), directory.clone(), cancel.clone(), record))
            .buffered(limit)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                ExportOutcome::Exported(record) => summary.exported.push(record),
                ExportOutcome::Failed(failure) => summary.export_failures.push(failure),
                ExportOutcome::NotAttempted => summary.cancelled = true,
            }
        }
    }

    async fn push_local_winner(&self, conflict: &Conflict, summary: &mut SyncSummary) {
        let local = &conflict.local;
        let Some(remote_ref) = conflict.remote.remote_ref.as_deref() else {
            let error = Error::ExportFailed {
                phone: local.phone.clone(),
                reason: "remote copy has no resource name".to_string(),
            };
            summary
                .export_failures
                .push(RecordFailure::new(local.clone(), error));
            return;
        };

        let target = ContactRecord {
            remote_version: conflict.remote.remote_version.clone(),
            ..local.clone()
        };
        let payload = normalize::to_remote_update(&target);

        match self
            .directory
            .update(remote_ref, target.remote_version.as_deref(), &payload)
            .await
        {
            Ok(updated) => {
                let linked = link(
                    self.store.as_ref(),
                    local.clone(),
                    updated.resource_name,
                    updated.etag,
                )
                .await;
                summary.exported.push(linked);
            }
            Err(e) => {
                tracing::warn!(id = %local.id, error = %e, "Pushing local winner failed");
                let error = Error::ExportFailed {
                    phone: local.phone.clone(),
                    reason: e.to_string(),
                };
                summary
                    .export_failures
                    .push(RecordFailure::new(local.clone(), error));
            }
        }
    }
}

async fn export_one(
    store: Arc<dyn ContactStore>,
    directory: Arc<dyn RemoteDirectory>,
    cancel: CancellationToken,
    record: ContactRecord,
) -> ExportOutcome {
    if cancel.is_cancelled() {
        return ExportOutcome::NotAttempted;
    }

    match directory.create(&normalize::to_remote(&record)).await {
        Ok(created) => {
            tracing::debug!(id = %record.id, remote_ref = %created.resource_name, "Exported contact");
            let linked = link(store.as_ref(), record, created.resource_name, created.etag).await;
            ExportOutcome::Exported(linked)
        }
        Err(e) => {
            tracing::warn!(id = %record.id, phone = %record.phone, error = %e, "Export failed");
            let error = Error::ExportFailed {
                phone: record.phone.clone(),
                reason: e.to_string(),
            };
            ExportOutcome::Failed(RecordFailure::new(record, error))
        }
    }
}

/// Record the remote resource on the local copy.
///
/// The remote write already happened, so a failure here is logged and the
/// patched record is still reported.
async fn link(
    store: &dyn ContactStore,
    mut record: ContactRecord,
    remote_ref: String,
    version: Option<String>,
) -> ContactRecord {
    let patch = ContactPatch::link(remote_ref, version);
    match store.update(&record.id, patch.clone()).await {
        Ok(linked) => linked,
        Err(e) => {
            tracing::warn!(id = %record.id, error = %e, "Could not link exported contact");
            record.apply_patch(patch, now_millis());
            record
        }
    }
}

fn log_summary(summary: &SyncSummary) {
    let counts = summary.counts();
    tracing::info!(
        mode = ?summary.mode,
        imported = counts.imported,
        exported = counts.exported,
        updated = counts.updated,
        conflicting = counts.conflicting,
        unchanged = counts.unchanged,
        failed = counts.failed,
        skipped_duplicates = counts.skipped_duplicates,
        cancelled = summary.cancelled,
        aborted = summary.aborted.is_some(),
        "Sync finished"
    );
}
