//! Applying user decisions to reconciliation conflicts.

use crate::{error::Result, Conflict, ContactRecord, Error, NormalizedPhone, Origin, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which side of a conflict should stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Keep the local record; the remote copy is discarded
    Local,
    /// Overwrite the local record's fields with the remote copy
    Remote,
}

/// Decisions keyed by conflict key.
pub type Decisions = HashMap<NormalizedPhone, Resolution>;

/// Resolve a batch of conflicts.
///
/// Every conflict must have a decision; otherwise nothing is produced and
/// [`Error::IncompleteResolution`] lists the undecided keys. The returned
/// records are the ones to write back to the local store, in conflict order.
/// Decisions for keys outside `conflicts` are ignored.
pub fn resolve(
    conflicts: &[Conflict],
    decisions: &Decisions,
    timestamp: Timestamp,
) -> Result<Vec<ContactRecord>> {
    let missing: Vec<NormalizedPhone> = conflicts
        .iter()
        .filter(|c| !decisions.contains_key(&c.key))
        .map(|c| c.key.clone())
        .collect();
    if !missing.is_empty() {
        return Err(Error::IncompleteResolution { missing });
    }

    let mut writes = Vec::new();
    for conflict in conflicts {
        match decisions[&conflict.key] {
            Resolution::Local => {}
            Resolution::Remote => writes.push(adopt_remote(conflict, timestamp)),
        }
    }
    Ok(writes)
}

/// The remote copy carrying the local identity.
fn adopt_remote(conflict: &Conflict, timestamp: Timestamp) -> ContactRecord {
    ContactRecord {
        id: conflict.local.id.clone(),
        created_at: conflict.local.created_at,
        updated_at: timestamp,
        origin: Origin::Merged,
        ..conflict.remote.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(key: &str, local_name: &str, remote_name: &str) -> Conflict {
        Conflict {
            key: key.into(),
            local: ContactRecord::new(format!("id-{key}"), local_name, key, 100),
            remote: ContactRecord::new("", remote_name, key, 500)
                .with_email("remote@example.com")
                .with_company("Remote Inc")
                .with_origin(Origin::Remote)
                .with_remote("people/c1", Some("etag-1".into())),
        }
    }

    #[test]
    fn remote_decision_keeps_local_identity() {
        let conflicts = vec![conflict("+1", "Jon", "Jonathan")];
        let decisions = Decisions::from([("+1".to_string(), Resolution::Remote)]);

        let writes = resolve(&conflicts, &decisions, 9000).unwrap();

        assert_eq!(writes.len(), 1);
        let record = &writes[0];
        assert_eq!(record.id, "id-+1");
        assert_eq!(record.created_at, 100);
        assert_eq!(record.updated_at, 9000);
        assert_eq!(record.name, "Jonathan");
        assert_eq!(record.email.as_deref(), Some("remote@example.com"));
        assert_eq!(record.company.as_deref(), Some("Remote Inc"));
        assert_eq!(record.remote_ref.as_deref(), Some("people/c1"));
        assert_eq!(record.origin, Origin::Merged);
    }

    #[test]
    fn local_decision_writes_nothing() {
        let conflicts = vec![conflict("+1", "Jon", "Jonathan")];
        let decisions = Decisions::from([("+1".to_string(), Resolution::Local)]);

        assert!(resolve(&conflicts, &decisions, 0).unwrap().is_empty());
    }

    #[test]
    fn missing_decision_is_rejected_wholesale() {
        let conflicts = vec![
            conflict("+1", "A", "B"),
            conflict("+2", "C", "D"),
            conflict("+3", "E", "F"),
        ];
        let decisions = Decisions::from([("+1".to_string(), Resolution::Remote)]);

        let err = resolve(&conflicts, &decisions, 0).unwrap_err();
        assert_eq!(
            err,
            Error::IncompleteResolution {
                missing: vec!["+2".into(), "+3".into()]
            }
        );
    }

    #[test]
    fn extra_decisions_are_ignored() {
        let conflicts = vec![conflict("+1", "A", "B")];
        let decisions = Decisions::from([
            ("+1".to_string(), Resolution::Remote),
            ("+404".to_string(), Resolution::Remote),
        ]);

        assert_eq!(resolve(&conflicts, &decisions, 0).unwrap().len(), 1);
    }

    #[test]
    fn writes_follow_conflict_order() {
        let conflicts = vec![
            conflict("+3", "A", "B"),
            conflict("+1", "C", "D"),
            conflict("+2", "E", "F"),
        ];
        let decisions: Decisions = ["+1", "+2", "+3"]
            .into_iter()
            .map(|k| (k.to_string(), Resolution::Remote))
            .collect();

        let ids: Vec<_> = resolve(&conflicts, &decisions, 0)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["id-+3", "id-+1", "id-+2"]);
    }

    #[test]
    fn empty_conflicts_resolve_to_nothing() {
        assert!(resolve(&[], &Decisions::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn resolution_serialization() {
        assert_eq!(serde_json::to_string(&Resolution::Remote).unwrap(), "\"remote\"");
        let parsed: Decisions = serde_json::from_str(r#"{"+1": "local"}"#).unwrap();
        assert_eq!(parsed["+1"], Resolution::Local);
    }
}
