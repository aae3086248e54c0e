//! Contact handlers - direct access to the local store.

use crate::directory::RemoteDirectory;
use crate::error::{AppError, Result};
use crate::now_millis;
use crate::store::ContactStore;
use rolodex_engine::{identity, ContactRecord, Error};
use serde::Deserialize;

/// Request body for creating a contact.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Query parameters for deleting a contact.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    /// Also delete the linked remote person
    #[serde(default)]
    pub remote: bool,
}

pub async fn handle_list_contacts(store: &dyn ContactStore) -> Result<Vec<ContactRecord>> {
    store.list().await
}

/// Create a locally authored contact.
pub async fn handle_add_contact(
    store: &dyn ContactStore,
    request: NewContact,
) -> Result<ContactRecord> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if identity::normalize_phone(&request.phone).is_none() {
        return Err(Error::UnmatchedRecord(request.name).into());
    }

    let mut record = ContactRecord::new("", request.name, request.phone, now_millis());
    record.email = request.email.filter(|e| !e.trim().is_empty());
    record.company = request.company.filter(|c| !c.trim().is_empty());

    let stored = store.add(record).await?;
    tracing::info!(id = %stored.id, "Contact created");
    Ok(stored)
}

/// Delete a contact, and its remote copy when asked to.
///
/// The remote person is deleted first so a directory failure leaves the
/// local contact in place.
pub async fn handle_delete_contact(
    store: &dyn ContactStore,
    directory: &dyn RemoteDirectory,
    id: &str,
    query: DeleteQuery,
) -> Result<ContactRecord> {
    let record = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contact {id}")))?;

    if query.remote {
        if let Some(remote_ref) = record.remote_ref.as_deref().filter(|r| !r.is_empty()) {
            directory.delete(remote_ref).await?;
            tracing::info!(id, remote_ref, "Remote contact deleted");
        }
    }

    store.delete(id).await
}
