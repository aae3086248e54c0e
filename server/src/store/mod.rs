//! Local contact store.

mod memory;
mod postgres;

pub use memory::MemoryContactStore;
pub use postgres::PgContactStore;

use crate::error::Result;
use async_trait::async_trait;
use rolodex_engine::{ContactPatch, ContactRecord};

/// The local side of reconciliation.
///
/// Implementations enforce phone uniqueness on the normalized key and fail
/// with `DuplicatePhone` when a write would break it.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// All contacts in insertion order.
    async fn list(&self) -> Result<Vec<ContactRecord>>;

    /// Insert a contact, minting an id when the record has none.
    async fn add(&self, record: ContactRecord) -> Result<ContactRecord>;

    async fn update(&self, id: &str, patch: ContactPatch) -> Result<ContactRecord>;

    async fn delete(&self, id: &str) -> Result<ContactRecord>;

    async fn get(&self, id: &str) -> Result<Option<ContactRecord>>;
}
