//! Reconciliation of the local contact list against the remote directory.
//!
//! This is the core of determinism. Given the full local set and the full
//! remote set, every record is classified exactly once.
//!
//! # Algorithm
//!
//! 1. Index local records by identity key (insertion order); a repeated
//!    local key violates the store invariant and fails the run
//! 2. Index remote records the same way; a repeated remote key keeps the
//!    first occurrence and reports the rest as skipped duplicates
//! 3. Remote-only keys become imports
//! 4. Local-only keys authored locally become exports
//! 5. Shared keys are compared on the identity-bearing fields: equal ones are
//!    unchanged, divergent ones become conflicts
//!
//! Records without a derivable key are counted, never matched.

use crate::{error::Result, identity, ContactRecord, Error, NormalizedPhone, Origin};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fields whose divergence turns a shared key into a conflict.
///
/// The phone is never compared: it is the join key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedFields {
    pub name: bool,
    pub email: bool,
    pub company: bool,
}

impl Default for ComparedFields {
    fn default() -> Self {
        Self::NAME_ONLY
    }
}

impl ComparedFields {
    /// Display name only.
    pub const NAME_ONLY: Self = Self {
        name: true,
        email: false,
        company: false,
    };

    /// Every comparable field.
    pub const ALL: Self = Self {
        name: true,
        email: true,
        company: true,
    };

    fn diverge(&self, local: &ContactRecord, remote: &ContactRecord) -> bool {
        (self.name && local.name != remote.name)
            || (self.email && local.email != remote.email)
            || (self.company && local.company != remote.company)
    }
}

impl std::str::FromStr for ComparedFields {
    type Err = String;

    /// Parse a comma-separated list such as `name,email`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut fields = Self {
            name: false,
            email: false,
            company: false,
        };
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part {
                "name" => fields.name = true,
                "email" => fields.email = true,
                "company" => fields.company = true,
                other => return Err(format!("unknown compared field: {other}")),
            }
        }
        if fields == (Self { name: false, email: false, company: false }) {
            return Err("at least one compared field is required".to_string());
        }
        Ok(fields)
    }
}

/// A key present on both sides with divergent comparable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// Normalized phone shared by both records
    pub key: NormalizedPhone,
    pub local: ContactRecord,
    pub remote: ContactRecord,
}

/// A remote record dropped because an earlier remote record had the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedDuplicate {
    pub key: NormalizedPhone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<String>,
    pub name: String,
}

/// Result of reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Present remotely, absent locally
    pub to_import: Vec<ContactRecord>,
    /// Authored locally, absent remotely
    pub to_export: Vec<ContactRecord>,
    /// Present on both sides with divergent fields
    pub conflicts: Vec<Conflict>,
    /// Present on both sides and identical
    pub unchanged: usize,
    /// Local records without a usable phone
    pub unmatched_local: usize,
    /// Remote records without a usable phone
    pub unmatched_remote: usize,
    /// Later remote records sharing a key with an earlier one
    pub skipped_duplicates: Vec<SkippedDuplicate>,
    /// Local records with remote provenance that no longer exist remotely
    pub orphaned: usize,
}

impl ReconciliationResult {
    /// Whether applying this result would change either side.
    pub fn is_noop(&self) -> bool {
        self.to_import.is_empty() && self.to_export.is_empty() && self.conflicts.is_empty()
    }
}

/// The reconciler classifies local and remote contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    compared: ComparedFields,
}

impl Reconciler {
    /// Create a reconciler comparing display names only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose which fields are identity-bearing.
    pub fn compare(mut self, fields: ComparedFields) -> Self {
        self.compared = fields;
        self
    }

    pub fn compared_fields(&self) -> ComparedFields {
        self.compared
    }

    /// Reconcile the full local set against the full remote set.
    ///
    /// Output order follows the input order: imports in remote order,
    /// exports and conflicts in local order.
    pub fn reconcile(
        &self,
        local: &[ContactRecord],
        remote: &[ContactRecord],
    ) -> Result<ReconciliationResult> {
        let mut result = ReconciliationResult::default();

        let mut local_by_key: IndexMap<NormalizedPhone, &ContactRecord> =
            IndexMap::with_capacity(local.len());
        for record in local {
            let Some(key) = identity::key(record) else {
                result.unmatched_local += 1;
                continue;
            };
            match local_by_key.entry(key) {
                Entry::Occupied(entry) => return Err(Error::DuplicatePhone(entry.key().clone())),
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }

        let mut remote_by_key: IndexMap<NormalizedPhone, &ContactRecord> =
            IndexMap::with_capacity(remote.len());
        for record in remote {
            let Some(key) = identity::key(record) else {
                result.unmatched_remote += 1;
                continue;
            };
            match remote_by_key.entry(key) {
                Entry::Occupied(entry) => result.skipped_duplicates.push(SkippedDuplicate {
                    key: entry.key().clone(),
                    remote_ref: record.remote_ref.clone(),
                    name: record.name.clone(),
                }),
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }

        for (key, remote_record) in &remote_by_key {
            if !local_by_key.contains_key(key) {
                result.to_import.push(ContactRecord {
                    origin: Origin::Remote,
                    ..(*remote_record).clone()
                });
            }
        }

        for (key, local_record) in &local_by_key {
            match remote_by_key.get(key) {
                None => match local_record.origin {
                    Origin::Local => result.to_export.push((*local_record).clone()),
                    Origin::Remote | Origin::Merged => result.orphaned += 1,
                },
                Some(remote_record) => {
                    if self.compared.diverge(local_record, remote_record) {
                        result.conflicts.push(Conflict {
                            key: key.clone(),
                            local: (*local_record).clone(),
                            remote: (*remote_record).clone(),
                        });
                    } else {
                        result.unchanged += 1;
                    }
                }
            }
        }

        Ok(result)
    }
}
