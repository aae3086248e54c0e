//! Mapping between the remote directory's wire shape and [`ContactRecord`].
//!
//! The directory stores every attribute as a repeated field (a person can
//! have several names, numbers, addresses and organizations). Normalization
//! keeps the first non-empty value of each; the rest are ignored.

use crate::{identity, ContactRecord, Origin, Timestamp};
use serde::{Deserialize, Serialize};

/// A name entry as stored by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl NameField {
    fn resolved(&self) -> Option<String> {
        if let Some(display) = non_blank(self.display_name.as_deref()) {
            return Some(display.to_string());
        }
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// A single-valued entry (phone number, email address).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueField {
    #[serde(default)]
    pub value: String,
}

impl ValueField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// An organization entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A person as returned by the remote directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRemoteRecord {
    /// Opaque resource identifier, e.g. `people/c123`
    #[serde(default)]
    pub resource_name: String,
    /// Concurrency token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<ValueField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<ValueField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<OrganizationField>,
}

/// Body of a create or update call against the directory.
///
/// Only fields that are non-empty in the source record are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<ValueField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<ValueField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<OrganizationField>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn first_value(fields: &[ValueField]) -> Option<String> {
    fields
        .iter()
        .find_map(|f| non_blank(Some(&f.value)))
        .map(str::to_string)
}

/// Convert a directory record into the canonical contact shape.
///
/// The result has an empty `id`: local identity is minted by the store when
/// the record is imported. A record without a usable phone number gets an
/// empty phone and is left out of matching.
pub fn from_remote(raw: &RawRemoteRecord, timestamp: Timestamp) -> ContactRecord {
    let name = raw
        .names
        .iter()
        .find_map(NameField::resolved)
        .unwrap_or_default();
    let phone = first_value(&raw.phone_numbers)
        .and_then(|p| identity::normalize_phone(&p))
        .unwrap_or_default();
    let company = raw
        .organizations
        .iter()
        .find_map(|o| non_blank(o.name.as_deref()))
        .map(str::to_string);
    let remote_ref = non_blank(Some(&raw.resource_name)).map(str::to_string);

    ContactRecord {
        id: String::new(),
        name,
        phone,
        email: first_value(&raw.email_addresses),
        company,
        remote_ref,
        remote_version: raw.etag.clone(),
        origin: Origin::Remote,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

/// Build a create payload from a contact, omitting empty fields.
pub fn to_remote(record: &ContactRecord) -> RemotePayload {
    let mut payload = RemotePayload::default();

    if let Some(name) = non_blank(Some(&record.name)) {
        payload.names.push(NameField {
            given_name: Some(name.to_string()),
            ..NameField::default()
        });
    }
    if let Some(phone) = non_blank(Some(&record.phone)) {
        payload.phone_numbers.push(ValueField::new(phone));
    }
    if let Some(email) = non_blank(record.email.as_deref()) {
        payload.email_addresses.push(ValueField::new(email));
    }
    if let Some(company) = non_blank(record.company.as_deref()) {
        payload.organizations.push(OrganizationField {
            name: Some(company.to_string()),
        });
    }

    payload
}

/// Build an update payload carrying the record's concurrency token.
pub fn to_remote_update(record: &ContactRecord) -> RemotePayload {
    RemotePayload {
        etag: record.remote_version.clone(),
        ..to_remote(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_person() -> RawRemoteRecord {
        RawRemoteRecord {
            resource_name: "people/c1".into(),
            etag: Some("%EgUBAi43PRoEAQIFByIMY2ZnN0".into()),
            names: vec![
                NameField {
                    display_name: Some("Jonathan".into()),
                    ..NameField::default()
                },
                NameField {
                    display_name: Some("Jon".into()),
                    ..NameField::default()
                },
            ],
            phone_numbers: vec![
                ValueField::new("+1 (555) 123-4567"),
                ValueField::new("+1 555 000 0000"),
            ],
            email_addresses: vec![ValueField::new(""), ValueField::new("jon@example.com")],
            organizations: vec![OrganizationField {
                name: Some("Acme".into()),
            }],
        }
    }

    #[test]
    fn from_remote_takes_first_values() {
        let record = from_remote(&raw_person(), 1000);

        assert_eq!(record.id, "");
        assert_eq!(record.name, "Jonathan");
        assert_eq!(record.phone, "+15551234567");
        assert_eq!(record.email.as_deref(), Some("jon@example.com"));
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.remote_ref.as_deref(), Some("people/c1"));
        assert!(record.remote_version.is_some());
        assert_eq!(record.origin, Origin::Remote);
        assert_eq!(record.created_at, 1000);
    }

    #[test]
    fn from_remote_falls_back_to_name_parts() {
        let raw = RawRemoteRecord {
            names: vec![NameField {
                display_name: None,
                given_name: Some("Mia".into()),
                family_name: Some("Wong".into()),
            }],
            ..RawRemoteRecord::default()
        };
        assert_eq!(from_remote(&raw, 0).name, "Mia Wong");
    }

    #[test]
    fn from_remote_without_phone() {
        let raw = RawRemoteRecord {
            resource_name: "people/c2".into(),
            names: vec![NameField {
                display_name: Some("No Number".into()),
                ..NameField::default()
            }],
            ..RawRemoteRecord::default()
        };
        let record = from_remote(&raw, 0);
        assert_eq!(record.phone, "");
        assert_eq!(identity::key(&record), None);
    }

    #[test]
    fn from_remote_malformed_phone_is_empty() {
        let raw = RawRemoteRecord {
            phone_numbers: vec![ValueField::new("call me maybe")],
            ..RawRemoteRecord::default()
        };
        assert_eq!(from_remote(&raw, 0).phone, "");
    }

    #[test]
    fn to_remote_omits_empty_fields() {
        let record = ContactRecord::new("a", "Jon", "+15551234567", 0);
        let payload = to_remote(&record);

        assert_eq!(payload.names.len(), 1);
        assert_eq!(payload.phone_numbers, vec![ValueField::new("+15551234567")]);
        assert!(payload.email_addresses.is_empty());
        assert!(payload.organizations.is_empty());
        assert!(payload.etag.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("emailAddresses").is_none());
        assert!(json.get("etag").is_none());
    }

    #[test]
    fn to_remote_blank_strings_are_omitted() {
        let record = ContactRecord::new("a", "  ", "+1555", 0).with_email(" ");
        let payload = to_remote(&record);
        assert!(payload.names.is_empty());
        assert!(payload.email_addresses.is_empty());
    }

    #[test]
    fn update_payload_carries_etag() {
        let record = ContactRecord::new("a", "Jon", "+1555", 0)
            .with_remote("people/c1", Some("etag-7".into()));
        assert_eq!(to_remote_update(&record).etag.as_deref(), Some("etag-7"));
    }

    #[test]
    fn export_then_normalize_preserves_fields() {
        let record = ContactRecord::new("a", "Jon Smith", "+15551234567", 0)
            .with_email("jon@example.com")
            .with_company("Acme");
        let payload = to_remote(&record);

        let raw = RawRemoteRecord {
            resource_name: "people/c5".into(),
            etag: Some("e".into()),
            names: payload.names,
            phone_numbers: payload.phone_numbers,
            email_addresses: payload.email_addresses,
            organizations: payload.organizations,
        };
        let back = from_remote(&raw, 0);

        assert_eq!(back.name, record.name);
        assert_eq!(back.phone, record.phone);
        assert_eq!(back.email, record.email);
        assert_eq!(back.company, record.company);
    }

    #[test]
    fn deserializes_directory_json() {
        let json = r#"{
            "resourceName": "people/c42",
            "etag": "abc",
            "names": [{"displayName": "Mia", "givenName": "Mia"}],
            "phoneNumbers": [{"value": "+1 555 999 8888", "type": "mobile"}]
        }"#;
        let raw: RawRemoteRecord = serde_json::from_str(json).unwrap();
        assert!(raw.email_addresses.is_empty());

        let record = from_remote(&raw, 5);
        assert_eq!(record.name, "Mia");
        assert_eq!(record.phone, "+15559998888");
    }
}
