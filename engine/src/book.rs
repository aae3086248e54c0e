//! ContactBook - an in-memory local contact store.
//!
//! Keeps contacts in insertion order and enforces phone uniqueness on the
//! normalized key. Contacts without a usable phone are allowed and never
//! collide with each other.

use crate::{
    error::Result, identity, ContactId, ContactPatch, ContactRecord, Error, NormalizedPhone,
    Timestamp,
};
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: IndexMap<ContactId, ContactRecord>,
    by_phone: HashMap<NormalizedPhone, ContactId>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from existing records, enforcing the same invariants as
    /// [`ContactBook::add`].
    pub fn from_records(records: impl IntoIterator<Item = ContactRecord>) -> Result<Self> {
        let mut book = Self::new();
        for record in records {
            book.add(record)?;
        }
        Ok(book)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Get a contact by ID.
    pub fn get(&self, id: &str) -> Option<&ContactRecord> {
        self.contacts.get(id)
    }

    /// Look up a contact by any formatting of its phone number.
    pub fn find_by_phone(&self, phone: &str) -> Option<&ContactRecord> {
        let key = identity::normalize_phone(phone)?;
        self.by_phone.get(&key).and_then(|id| self.contacts.get(id))
    }

    /// All contacts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ContactRecord> {
        self.contacts.values()
    }

    /// Insert a new contact.
    ///
    /// A record with an empty `id` receives a freshly minted one.
    pub fn add(&mut self, mut record: ContactRecord) -> Result<ContactRecord> {
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }
        if self.contacts.contains_key(&record.id) {
            return Err(Error::ContactAlreadyExists(record.id));
        }

        let key = identity::key(&record);
        if let Some(key) = &key {
            if self.by_phone.contains_key(key) {
                return Err(Error::DuplicatePhone(key.clone()));
            }
        }

        if let Some(key) = key {
            self.by_phone.insert(key, record.id.clone());
        }
        self.contacts.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Apply a partial update to an existing contact.
    pub fn update(
        &mut self,
        id: &str,
        patch: ContactPatch,
        timestamp: Timestamp,
    ) -> Result<ContactRecord> {
        let current = self
            .contacts
            .get(id)
            .ok_or_else(|| Error::ContactNotFound(id.to_string()))?;

        let mut updated = current.clone();
        updated.apply_patch(patch, timestamp);

        let old_key = identity::key(current);
        let new_key = identity::key(&updated);
        if new_key != old_key {
            if let Some(key) = &new_key {
                if self.by_phone.contains_key(key) {
                    return Err(Error::DuplicatePhone(key.clone()));
                }
            }
            if let Some(key) = old_key {
                self.by_phone.remove(&key);
            }
            if let Some(key) = new_key {
                self.by_phone.insert(key, updated.id.clone());
            }
        }

        self.contacts.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Remove a contact, returning it.
    pub fn delete(&mut self, id: &str) -> Result<ContactRecord> {
        let record = self
            .contacts
            .shift_remove(id)
            .ok_or_else(|| Error::ContactNotFound(id.to_string()))?;
        if let Some(key) = identity::key(&record) {
            self.by_phone.remove(&key);
        }
        Ok(record)
    }
}
