//! In-memory directory and store fakes for sync tests.

use crate::directory::{DirectoryError, RemoteDirectory, RemotePage};
use crate::error::{self, AppError};
use crate::store::{ContactStore, MemoryContactStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use rolodex_engine::normalize::{NameField, ValueField};
use rolodex_engine::{
    identity, ContactBook, ContactPatch, ContactRecord, Error, RawRemoteRecord, RemotePayload,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

pub fn person(resource_name: &str, name: &str, phone: &str) -> RawRemoteRecord {
    RawRemoteRecord {
        resource_name: resource_name.to_string(),
        etag: Some(format!("etag-{resource_name}")),
        names: vec![NameField {
            display_name: Some(name.to_string()),
            ..NameField::default()
        }],
        phone_numbers: vec![ValueField::new(phone)],
        ..RawRemoteRecord::default()
    }
}

/// Holds the first `list` call until released.
#[derive(Clone)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Semaphore>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
        }
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    pages: Vec<Vec<RawRemoteRecord>>,
    looping: bool,
    failing_page: Mutex<Option<usize>>,
    gate: Mutex<Option<Gate>>,
    rejected_phones: Mutex<HashSet<String>>,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    created: Mutex<Vec<RemotePayload>>,
    updated: Mutex<Vec<(String, Option<String>, RemotePayload)>>,
    deleted: Mutex<Vec<String>>,
    on_create: Mutex<Option<Hook>>,
}

type Hook = Box<dyn FnOnce() + Send>;

impl FakeDirectory {
    pub fn with_pages(pages: Vec<Vec<RawRemoteRecord>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// A directory whose listing hands back the same next-page token forever.
    pub fn looping() -> Self {
        Self {
            looping: true,
            ..Self::default()
        }
    }

    pub fn fail_page(&self, index: usize) {
        *self.failing_page.lock() = Some(index);
    }

    pub fn reject_phone(&self, phone: &str) {
        self.rejected_phones.lock().insert(phone.to_string());
    }

    pub fn gate(&self) -> Gate {
        let gate = Gate::new();
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Run `hook` inside the first `create` call.
    pub fn on_first_create(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_create.lock() = Some(Box::new(hook));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<RemotePayload> {
        self.created.lock().clone()
    }

    pub fn updated(&self) -> Vec<(String, Option<String>, RemotePayload)> {
        self.updated.lock().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl RemoteDirectory for FakeDirectory {
    async fn list(&self, page_token: Option<&str>) -> Result<RemotePage, DirectoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.release.acquire().await {
                permit.forget();
            }
        }

        if self.looping {
            return Ok(RemotePage {
                records: Vec::new(),
                next_page_token: Some("p1".to_string()),
            });
        }

        let index = match page_token {
            None => 0,
            Some(token) => token
                .trim_start_matches('p')
                .parse::<usize>()
                .map_err(|_| DirectoryError::Rejected(format!("bad page token {token}")))?,
        };
        if *self.failing_page.lock() == Some(index) {
            return Err(DirectoryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        Ok(RemotePage {
            records: self.pages.get(index).cloned().unwrap_or_default(),
            next_page_token: (index + 1 < self.pages.len()).then(|| format!("p{}", index + 1)),
        })
    }

    async fn create(&self, payload: &RemotePayload) -> Result<RawRemoteRecord, DirectoryError> {
        let hook = self.on_create.lock().take();
        if let Some(hook) = hook {
            hook();
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let phone = payload
            .phone_numbers
            .first()
            .map(|p| p.value.clone())
            .unwrap_or_default();
        if self.rejected_phones.lock().contains(&phone) {
            return Err(DirectoryError::Status {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }

        self.created.lock().push(payload.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RawRemoteRecord {
            resource_name: format!("people/new{n}"),
            etag: Some(format!("etag-new{n}")),
            names: payload.names.clone(),
            phone_numbers: payload.phone_numbers.clone(),
            email_addresses: payload.email_addresses.clone(),
            organizations: payload.organizations.clone(),
        })
    }

    async fn update(
        &self,
        remote_ref: &str,
        version: Option<&str>,
        payload: &RemotePayload,
    ) -> Result<RawRemoteRecord, DirectoryError> {
        self.updated.lock().push((
            remote_ref.to_string(),
            version.map(str::to_string),
            payload.clone(),
        ));
        Ok(RawRemoteRecord {
            resource_name: remote_ref.to_string(),
            etag: Some(format!("{}-next", version.unwrap_or("etag"))),
            names: payload.names.clone(),
            phone_numbers: payload.phone_numbers.clone(),
            email_addresses: payload.email_addresses.clone(),
            organizations: payload.organizations.clone(),
        })
    }

    async fn delete(&self, remote_ref: &str) -> Result<(), DirectoryError> {
        self.deleted.lock().push(remote_ref.to_string());
        Ok(())
    }
}

/// A [`MemoryContactStore`] with scripted failures.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryContactStore,
    adds: AtomicUsize,
    updates: AtomicUsize,
    failing_add: Mutex<Option<usize>>,
    failing_update: Mutex<Option<usize>>,
    duplicate_keys: Mutex<HashSet<String>>,
    after_add: Mutex<Option<Hook>>,
}

impl ScriptedStore {
    pub fn new(records: Vec<ContactRecord>) -> Self {
        Self {
            inner: MemoryContactStore::with_book(ContactBook::from_records(records).unwrap()),
            ..Self::default()
        }
    }

    /// The `n`th `add` (1-based) fails with a store error.
    pub fn fail_add(&self, n: usize) {
        *self.failing_add.lock() = Some(n);
    }

    /// The `n`th `update` (1-based) fails with a store error.
    pub fn fail_update(&self, n: usize) {
        *self.failing_update.lock() = Some(n);
    }

    /// Adds with this phone key fail with `DuplicatePhone`.
    pub fn duplicate(&self, key: &str) {
        self.duplicate_keys.lock().insert(key.to_string());
    }

    /// Run `hook` after the first successful `add`.
    pub fn after_first_add(&self, hook: impl FnOnce() + Send + 'static) {
        *self.after_add.lock() = Some(Box::new(hook));
    }
}

fn connection_reset() -> AppError {
    AppError::Internal("connection reset".to_string())
}

#[async_trait]
impl ContactStore for ScriptedStore {
    async fn list(&self) -> error::Result<Vec<ContactRecord>> {
        self.inner.list().await
    }

    async fn add(&self, record: ContactRecord) -> error::Result<ContactRecord> {
        let n = self.adds.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.failing_add.lock() == Some(n) {
            return Err(connection_reset());
        }
        if let Some(key) = identity::key(&record) {
            if self.duplicate_keys.lock().contains(&key) {
                return Err(Error::DuplicatePhone(key).into());
            }
        }

        let stored = self.inner.add(record).await?;
        let hook = self.after_add.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: ContactPatch) -> error::Result<ContactRecord> {
        let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.failing_update.lock() == Some(n) {
            return Err(connection_reset());
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> error::Result<ContactRecord> {
        self.inner.delete(id).await
    }

    async fn get(&self, id: &str) -> error::Result<Option<ContactRecord>> {
        self.inner.get(id).await
    }
}
