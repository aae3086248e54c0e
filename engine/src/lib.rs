//! # Rolodex Engine
//!
//! A deterministic reconciliation engine for a local contact list and a
//! remote contact directory.
//!
//! This crate provides the pure part of contact synchronization: matching
//! records by identity key, classifying the delta between both sides, and
//! applying conflict decisions. The same inputs always produce the same
//! outputs, in the same order.
//!
//! ## Design Principles
//!
//! - **No IO**: Paging through the directory and writing to stores happens
//!   in the caller; the engine only sees complete in-memory sets
//! - **Deterministic**: Output order follows input order
//! - **Loud invariants**: A local store that breaks phone uniqueness fails
//!   reconciliation instead of producing a misleading delta
//!
//! ## Core Concepts
//!
//! ### Identity
//!
//! Records match when their normalized phone numbers are equal (see
//! [`identity`]). Records without a usable phone are counted as unmatched.
//!
//! ### Normalization
//!
//! [`normalize::from_remote`] maps the directory's repeated-field records
//! onto [`ContactRecord`]; [`normalize::to_remote`] builds create payloads.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] produces a [`ReconciliationResult`]: records to
//! import, records to export, conflicts and an unchanged count.
//!
//! ### Resolution
//!
//! [`resolve()`] turns per-key [`Resolution`] decisions into the records to
//! write back, keeping local identity.
//!
//! ## Quick Start
//!
//! ```rust
//! use rolodex_engine::{resolve, ContactRecord, Decisions, Origin, Reconciler, Resolution};
//!
//! let local = vec![ContactRecord::new("a", "Jon", "+15551234567", 1000)];
//! let remote = vec![
//!     ContactRecord::new("", "Jonathan", "+15551234567", 1000).with_origin(Origin::Remote),
//!     ContactRecord::new("", "Mia", "+15559998888", 1000).with_origin(Origin::Remote),
//! ];
//!
//! let result = Reconciler::new().reconcile(&local, &remote).unwrap();
//! assert_eq!(result.to_import.len(), 1);
//! assert_eq!(result.conflicts.len(), 1);
//!
//! let decisions = Decisions::from([("+15551234567".to_string(), Resolution::Remote)]);
//! let writes = resolve(&result.conflicts, &decisions, 2000).unwrap();
//! assert_eq!(writes[0].id, "a");
//! assert_eq!(writes[0].name, "Jonathan");
//! ```

pub mod book;
pub mod contact;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod reconcile;
pub mod resolve;
pub mod summary;

// Re-export main types at crate root
pub use book::ContactBook;
pub use contact::{ContactPatch, ContactRecord, Origin};
pub use error::Error;
pub use normalize::{RawRemoteRecord, RemotePayload};
pub use reconcile::{ComparedFields, Conflict, ReconciliationResult, Reconciler, SkippedDuplicate};
pub use resolve::{resolve, Decisions, Resolution};
pub use summary::{RecordFailure, SyncCounts, SyncMode, SyncSummary};

/// Type aliases for clarity
pub type ContactId = String;
pub type NormalizedPhone = String;
pub type Timestamp = u64;
