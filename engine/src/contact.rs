//! Contact records and partial updates.

use crate::{ContactId, Timestamp};
use serde::{Deserialize, Serialize};

/// Provenance of a contact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Authored locally
    Local,
    /// Imported from the remote directory
    Remote,
    /// Local identity carrying fields adopted from the remote directory
    Merged,
}

impl Origin {
    /// Whether a record with this origin has ever been associated with the
    /// remote directory.
    pub fn has_remote_provenance(self) -> bool {
        match self {
            Origin::Local => false,
            Origin::Remote | Origin::Merged => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
            Origin::Merged => "merged",
        }
    }
}

impl std::str::FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Origin::Local),
            "remote" => Ok(Origin::Remote),
            "merged" => Ok(Origin::Merged),
            other => Err(format!("unknown origin: {other}")),
        }
    }
}

/// The canonical contact shape shared by the local store and the normalized
/// remote directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    /// Local-store identity. Empty for records that have not been stored yet.
    #[serde(default)]
    pub id: ContactId,
    pub name: String,
    /// Phone number as entered; matching uses its normalized form
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Remote resource identifier, once associated with the directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<String>,
    /// Remote concurrency token (etag)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_version: Option<String>,
    pub origin: Origin,
    /// Milliseconds since epoch
    pub created_at: Timestamp,
    /// Milliseconds since epoch
    pub updated_at: Timestamp,
}

impl ContactRecord {
    /// Create a locally authored contact.
    pub fn new(
        id: impl Into<ContactId>,
        name: impl Into<String>,
        phone: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            company: None,
            remote_ref: None,
            remote_version: None,
            origin: Origin::Local,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Associate the record with a remote resource.
    pub fn with_remote(mut self, remote_ref: impl Into<String>, version: Option<String>) -> Self {
        self.remote_ref = Some(remote_ref.into());
        self.remote_version = version;
        self
    }

    /// Whether the record carries a remote resource identifier.
    pub fn is_linked(&self) -> bool {
        self.remote_ref.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Apply a partial update. Identity and creation time never change.
    pub fn apply_patch(&mut self, patch: ContactPatch, timestamp: Timestamp) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(remote_ref) = patch.remote_ref {
            self.remote_ref = remote_ref;
        }
        if let Some(remote_version) = patch.remote_version {
            self.remote_version = remote_version;
        }
        if let Some(origin) = patch.origin {
            self.origin = origin;
        }
        self.updated_at = timestamp;
    }
}

/// A partial update to a stored contact.
///
/// `None` leaves a field untouched. Nullable fields use a nested option so a
/// patch can clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub remote_ref: Option<Option<String>>,
    pub remote_version: Option<Option<String>>,
    pub origin: Option<Origin>,
}

impl ContactPatch {
    /// Overwrite every mutable field with the values of `record`.
    pub fn adopt(record: &ContactRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            phone: Some(record.phone.clone()),
            email: Some(record.email.clone()),
            company: Some(record.company.clone()),
            remote_ref: Some(record.remote_ref.clone()),
            remote_version: Some(record.remote_version.clone()),
            origin: Some(record.origin),
        }
    }

    /// Record the remote resource a contact was exported to.
    pub fn link(remote_ref: impl Into<String>, remote_version: Option<String>) -> Self {
        Self {
            remote_ref: Some(Some(remote_ref.into())),
            remote_version: Some(remote_version),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
