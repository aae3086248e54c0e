//! Sync endpoint routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_cancel, handle_conflicts, handle_export, handle_full_sync, handle_import,
    handle_resolve, CancelResponse, ConflictsResponse, ExportRequest, ResolveRequest,
    SyncResponse,
};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/full", post(full_handler))
        .route("/sync/import", post(import_handler))
        .route("/sync/export", post(export_handler))
        .route("/sync/conflicts", get(conflicts_handler))
        .route("/sync/resolve", post(resolve_handler))
        .route("/sync/cancel", post(cancel_handler))
}

/// POST /sync/full - Import, export and report conflicts.
async fn full_handler(State(state): State<AppState>) -> Result<Json<SyncResponse>> {
    let response = handle_full_sync(&state.orchestrator).await?;
    Ok(Json(response))
}

/// POST /sync/import - Import only.
async fn import_handler(State(state): State<AppState>) -> Result<Json<SyncResponse>> {
    let response = handle_import(&state.orchestrator).await?;
    Ok(Json(response))
}

/// POST /sync/export - Export the listed local contacts.
async fn export_handler(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<SyncResponse>> {
    let response = handle_export(&state.orchestrator, state.store.as_ref(), request).await?;
    Ok(Json(response))
}

/// GET /sync/conflicts - Conflicts awaiting a decision.
async fn conflicts_handler(State(state): State<AppState>) -> Result<Json<ConflictsResponse>> {
    let response = handle_conflicts(&state.orchestrator)?;
    Ok(Json(response))
}

/// POST /sync/resolve - Apply decisions to the outstanding conflicts.
async fn resolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<SyncResponse>> {
    let response = handle_resolve(&state.orchestrator, request).await?;
    Ok(Json(response))
}

/// POST /sync/cancel - Cancel the running operation.
async fn cancel_handler(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(handle_cancel(&state.orchestrator))
}
