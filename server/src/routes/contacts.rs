//! Contact endpoint routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use rolodex_engine::ContactRecord;

use crate::error::Result;
use crate::handlers::{
    handle_add_contact, handle_delete_contact, handle_list_contacts, DeleteQuery, NewContact,
};
use crate::AppState;

/// Create contact routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_handler).post(add_handler))
        .route("/contacts/{id}", delete(delete_handler))
}

/// GET /contacts - List local contacts in insertion order.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<ContactRecord>>> {
    let contacts = handle_list_contacts(state.store.as_ref()).await?;
    Ok(Json(contacts))
}

/// POST /contacts - Create a local contact.
async fn add_handler(
    State(state): State<AppState>,
    Json(request): Json<NewContact>,
) -> Result<(StatusCode, Json<ContactRecord>)> {
    let contact = handle_add_contact(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// DELETE /contacts/{id} - Delete a contact, optionally with `?remote=true`.
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ContactRecord>> {
    let contact = handle_delete_contact(
        state.store.as_ref(),
        state.directory.as_ref(),
        &id,
        query,
    )
    .await?;
    Ok(Json(contact))
}
