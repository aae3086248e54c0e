//! Sync handlers - drive the orchestrator and shape its summaries.

use crate::error::{AppError, Result};
use crate::store::ContactStore;
use crate::sync::SyncOrchestrator;
use indexmap::IndexSet;
use rolodex_engine::{Conflict, ContactId, Decisions, SyncCounts, SyncSummary};
use serde::{Deserialize, Serialize};

/// Response for every sync operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Every attempted write succeeded and nothing was skipped
    pub complete: bool,
    pub counts: SyncCounts,
    #[serde(flatten)]
    pub summary: SyncSummary,
}

impl From<SyncSummary> for SyncResponse {
    fn from(summary: SyncSummary) -> Self {
        Self {
            complete: summary.is_complete(),
            counts: summary.counts(),
            summary,
        }
    }
}

/// Request body for exporting selected contacts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Local contact IDs to create remotely
    pub ids: Vec<ContactId>,
}

/// Request body for resolving conflicts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// One decision per outstanding conflict key
    pub decisions: Decisions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictsResponse {
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    /// Whether an operation was running when cancellation was requested
    pub cancelled: bool,
}

pub async fn handle_full_sync(orchestrator: &SyncOrchestrator) -> Result<SyncResponse> {
    Ok(orchestrator.full_sync().await?.into())
}

pub async fn handle_import(orchestrator: &SyncOrchestrator) -> Result<SyncResponse> {
    Ok(orchestrator.import_only().await?.into())
}

/// Look up the requested contacts and export them.
///
/// Every ID must exist; repeated IDs are exported once.
pub async fn handle_export(
    orchestrator: &SyncOrchestrator,
    store: &dyn ContactStore,
    request: ExportRequest,
) -> Result<SyncResponse> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".to_string()));
    }

    let ids: IndexSet<ContactId> = request.ids.into_iter().collect();
    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        let record = store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("contact {id}")))?;
        records.push(record);
    }

    Ok(orchestrator.export_selected(records).await?.into())
}

pub async fn handle_resolve(
    orchestrator: &SyncOrchestrator,
    request: ResolveRequest,
) -> Result<SyncResponse> {
    Ok(orchestrator
        .resolve_conflicts(&request.decisions)
        .await?
        .into())
}

pub fn handle_conflicts(orchestrator: &SyncOrchestrator) -> Result<ConflictsResponse> {
    Ok(ConflictsResponse {
        conflicts: orchestrator.outstanding_conflicts()?,
    })
}

pub fn handle_cancel(orchestrator: &SyncOrchestrator) -> CancelResponse {
    CancelResponse {
        cancelled: orchestrator.cancel(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContactStore;
    use crate::sync::testing::{person, FakeDirectory};
    use crate::sync::SyncSettings;
    use rolodex_engine::{ContactRecord, Reconciler};
    use std::sync::Arc;

    fn setup(pages: Vec<Vec<rolodex_engine::RawRemoteRecord>>) -> (SyncOrchestrator, Arc<MemoryContactStore>) {
        let store = Arc::new(MemoryContactStore::new());
        let orchestrator = SyncOrchestrator::new(
            store.clone(),
            Arc::new(FakeDirectory::with_pages(pages)),
            Reconciler::new(),
            SyncSettings::default(),
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn sync_response_flattens_summary() {
        let (orchestrator, store) = setup(vec![vec![person("people/c1", "Mia", "+15559998888")]]);
        store
            .add(ContactRecord::new("a", "Jon", "+15551234567", 0))
            .await
            .unwrap();

        let response = handle_full_sync(&orchestrator).await.unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["complete"], true);
        assert_eq!(json["mode"], "full");
        assert_eq!(json["counts"]["imported"], 1);
        assert_eq!(json["counts"]["exported"], 1);
        assert_eq!(json["imported"][0]["name"], "Mia");
        assert_eq!(json["exported"][0]["remoteRef"], "people/new1");
    }

    #[tokio::test]
    async fn export_requires_known_ids() {
        let (orchestrator, store) = setup(vec![]);
        store
            .add(ContactRecord::new("a", "Jon", "+1", 0))
            .await
            .unwrap();

        let err = handle_export(&orchestrator, store.as_ref(), ExportRequest { ids: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let request = ExportRequest {
            ids: vec!["a".into(), "missing".into()],
        };
        let err = handle_export(&orchestrator, store.as_ref(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn export_deduplicates_ids() {
        let (orchestrator, store) = setup(vec![]);
        store
            .add(ContactRecord::new("a", "Jon", "+1", 0))
            .await
            .unwrap();

        let request = ExportRequest {
            ids: vec!["a".into(), "a".into()],
        };
        let response = handle_export(&orchestrator, store.as_ref(), request)
            .await
            .unwrap();
        assert_eq!(response.counts.exported, 1);
    }

    #[tokio::test]
    async fn resolve_request_parses_decisions() {
        let (orchestrator, store) = setup(vec![vec![person("people/c1", "Jonathan", "+1555")]]);
        store
            .add(ContactRecord::new("a", "Jon", "+1555", 0))
            .await
            .unwrap();
        handle_import(&orchestrator).await.unwrap();
        assert_eq!(handle_conflicts(&orchestrator).unwrap().conflicts.len(), 1);

        let request: ResolveRequest =
            serde_json::from_str(r#"{"decisions": {"+1555": "remote"}}"#).unwrap();
        let response = handle_resolve(&orchestrator, request).await.unwrap();

        assert_eq!(response.counts.updated, 1);
        assert!(handle_conflicts(&orchestrator).unwrap().conflicts.is_empty());
        assert!(!handle_cancel(&orchestrator).cancelled);
    }
}
