//! Error types for the Rolodex engine.

use crate::{ContactId, NormalizedPhone};
use thiserror::Error;

/// All possible errors from the reconciliation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Sync-aborting errors
    #[error("remote directory unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("incomplete resolution: no decision for {}", .missing.join(", "))]
    IncompleteResolution { missing: Vec<NormalizedPhone> },

    #[error("sync already in progress")]
    SyncInProgress,

    #[error("sync cancelled")]
    Cancelled,

    // Per-record errors
    #[error("duplicate phone: {0}")]
    DuplicatePhone(NormalizedPhone),

    #[error("export of '{phone}' failed: {reason}")]
    ExportFailed { phone: String, reason: String },

    #[error("record has no usable phone number: {0}")]
    UnmatchedRecord(String),

    // Store errors
    #[error("contact not found: {0}")]
    ContactNotFound(ContactId),

    #[error("contact already exists: {0}")]
    ContactAlreadyExists(ContactId),
}

impl Error {
    /// Whether this error aborts a whole sync run rather than a single record.
    pub fn is_sync_aborting(&self) -> bool {
        match self {
            Error::RemoteUnavailable(_)
            | Error::IncompleteResolution { .. }
            | Error::SyncInProgress
            | Error::Cancelled => true,
            Error::DuplicatePhone(_)
            | Error::ExportFailed { .. }
            | Error::UnmatchedRecord(_)
            | Error::ContactNotFound(_)
            | Error::ContactAlreadyExists(_) => false,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
