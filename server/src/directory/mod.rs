//! Remote contact directory.
//!
//! The sync layer only talks to the directory through [`RemoteDirectory`], so
//! the HTTP client can be swapped for an in-memory fake in tests.

mod http;

pub use http::HttpDirectory;

use async_trait::async_trait;
use rolodex_engine::{RawRemoteRecord, RemotePayload};
use serde::{Deserialize, Serialize};

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePage {
    #[serde(default, rename = "connections")]
    pub records: Vec<RawRemoteRecord>,
    /// Absent or empty on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Errors returned by a directory implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Operations the sync layer needs from the remote directory.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetch one page. `None` requests the first page.
    async fn list(&self, page_token: Option<&str>) -> Result<RemotePage, DirectoryError>;

    /// Create a person, returning the stored record with its resource name.
    async fn create(&self, payload: &RemotePayload) -> Result<RawRemoteRecord, DirectoryError>;

    /// Overwrite a person's fields. `version` is the last etag seen for it.
    async fn update(
        &self,
        remote_ref: &str,
        version: Option<&str>,
        payload: &RemotePayload,
    ) -> Result<RawRemoteRecord, DirectoryError>;

    async fn delete(&self, remote_ref: &str) -> Result<(), DirectoryError>;
}
