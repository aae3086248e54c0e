//! In-process store backed by the engine's [`ContactBook`].

use super::ContactStore;
use crate::error::Result;
use crate::now_millis;
use async_trait::async_trait;
use parking_lot::Mutex;
use rolodex_engine::{ContactBook, ContactPatch, ContactRecord};

/// Store used when no database is configured. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryContactStore {
    book: Mutex<ContactBook>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(book: ContactBook) -> Self {
        Self {
            book: Mutex::new(book),
        }
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn list(&self) -> Result<Vec<ContactRecord>> {
        Ok(self.book.lock().iter().cloned().collect())
    }

    async fn add(&self, record: ContactRecord) -> Result<ContactRecord> {
        Ok(self.book.lock().add(record)?)
    }

    async fn update(&self, id: &str, patch: ContactPatch) -> Result<ContactRecord> {
        Ok(self.book.lock().update(id, patch, now_millis())?)
    }

    async fn delete(&self, id: &str) -> Result<ContactRecord> {
        Ok(self.book.lock().delete(id)?)
    }

    async fn get(&self, id: &str) -> Result<Option<ContactRecord>> {
        Ok(self.book.lock().get(id).cloned())
    }
}
