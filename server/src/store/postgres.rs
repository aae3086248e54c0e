//! PostgreSQL-backed store.

use super::ContactStore;
use crate::db::{self, Pool, StoredContact};
use crate::error::{AppError, Result};
use crate::now_millis;
use async_trait::async_trait;
use rolodex_engine::{identity, ContactPatch, ContactRecord, Error};

pub struct PgContactStore {
    pool: Pool,
}

impl PgContactStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn to_record(stored: &StoredContact) -> Result<ContactRecord> {
    stored.to_record().map_err(|e| {
        AppError::Internal(format!("Failed to convert stored contact {}: {}", stored.id, e))
    })
}

/// Map a write failure onto the store's error contract.
fn write_error(e: sqlx::Error, record: &ContactRecord) -> AppError {
    if db::is_unique_violation(&e, Some(db::PHONE_KEY_CONSTRAINT)) {
        if let Some(key) = identity::key(record) {
            return Error::DuplicatePhone(key).into();
        }
    }
    if db::is_unique_violation(&e, None) {
        return Error::ContactAlreadyExists(record.id.clone()).into();
    }
    e.into()
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn list(&self) -> Result<Vec<ContactRecord>> {
        db::list_contacts(&self.pool)
            .await?
            .iter()
            .map(to_record)
            .collect()
    }

    async fn add(&self, mut record: ContactRecord) -> Result<ContactRecord> {
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }

        db::insert_contact(&self.pool, &record)
            .await
            .map_err(|e| write_error(e, &record))?;

        tracing::debug!(id = %record.id, "Inserted contact");
        Ok(record)
    }

    async fn update(&self, id: &str, patch: ContactPatch) -> Result<ContactRecord> {
        let mut tx = self.pool.begin().await?;

        let stored = db::get_contact_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::ContactNotFound(id.to_string()))?;

        let mut record = to_record(&stored)?;
        record.apply_patch(patch, now_millis());

        db::update_contact(&mut *tx, &record)
            .await
            .map_err(|e| write_error(e, &record))?;
        tx.commit().await?;

        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<ContactRecord> {
        let stored = db::delete_contact(&self.pool, id)
            .await?
            .ok_or_else(|| Error::ContactNotFound(id.to_string()))?;
        to_record(&stored)
    }

    async fn get(&self, id: &str) -> Result<Option<ContactRecord>> {
        db::get_contact(&self.pool, id)
            .await?
            .as_ref()
            .map(to_record)
            .transpose()
    }
}
