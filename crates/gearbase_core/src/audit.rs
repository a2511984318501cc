//! Append-only audit trail.
//!
//! Every state-changing action in the core appends exactly one entry.
//! Entries are never mutated or deleted; there is deliberately no update
//! or delete operation on this collection.

use crate::codec::{collections, from_record, short_key, to_record};
use crate::error::CoreResult;
use gearbase_auth::Claims;
use gearbase_store::{now_stamp, CollectionStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Generated key, `LOG-` prefixed.
    pub id: String,
    /// When the action happened.
    pub timestamp: String,
    /// Action kind, e.g. `checkout`, `reservation`, `delete`.
    pub action: String,
    /// Kind of the target entity.
    pub entity_type: String,
    /// Key of the target entity.
    pub entity_id: String,
    /// Human-readable summary.
    pub description: String,
    /// Actor's username, or `system` for unattributed actions.
    pub user_name: String,
    /// Structured escape hatch for action-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Fields this view does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for listing audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only entries with exactly this action.
    pub action: Option<String>,
    /// Only entries whose actor name contains this (case-insensitive).
    pub actor_contains: Option<String>,
}

/// Writes and lists audit entries.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<CollectionStore>,
}

impl AuditTrail {
    /// Creates an audit trail over the given store.
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Appends one entry describing a state-changing action.
    pub fn record(
        &self,
        actor: Option<&Claims>,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        description: impl Into<String>,
        details: Option<Value>,
    ) -> CoreResult<AuditEntry> {
        let entry = AuditEntry {
            id: short_key("LOG"),
            timestamp: now_stamp(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            description: description.into(),
            user_name: actor.map_or_else(|| "system".to_string(), |c| c.username.clone()),
            details,
            extra: Map::new(),
        };

        let record = to_record(collections::AUDIT_LOG, &entry)?;
        let stored = self.store.insert(collections::AUDIT_LOG, record)?;
        from_record(collections::AUDIT_LOG, stored)
    }

    /// Returns all entries, newest first.
    pub fn entries(&self) -> CoreResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .store
            .get_all(collections::AUDIT_LOG)?
            .into_iter()
            .map(|r| from_record(collections::AUDIT_LOG, r))
            .collect::<CoreResult<_>>()?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Returns entries matching a filter, newest first.
    pub fn filtered(&self, filter: &AuditFilter) -> CoreResult<Vec<AuditEntry>> {
        let mut entries = self.entries()?;

        if let Some(action) = &filter.action {
            entries.retain(|e| &e.action == action);
        }
        if let Some(actor) = &filter.actor_contains {
            let needle = actor.to_lowercase();
            entries.retain(|e| e.user_name.to_lowercase().contains(&needle));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearbase_auth::Role;
    use tempfile::{tempdir, TempDir};

    fn create_trail() -> (AuditTrail, TempDir) {
        let temp = tempdir().unwrap();
        let store = Arc::new(CollectionStore::open(temp.path()).unwrap());
        (AuditTrail::new(store), temp)
    }

    fn claims(username: &str) -> Claims {
        Claims {
            user_id: 1,
            username: username.to_string(),
            role: Role::Admin,
            exp: u64::MAX,
        }
    }

    #[test]
    fn records_actor_and_target() {
        let (trail, _temp) = create_trail();
        let actor = claims("alice");

        let entry = trail
            .record(
                Some(&actor),
                "checkout",
                "asset",
                "CAM001",
                "Checked out to Bob",
                None,
            )
            .unwrap();

        assert!(entry.id.starts_with("LOG-"));
        assert_eq!(entry.user_name, "alice");
        assert_eq!(entry.entity_id, "CAM001");
    }

    #[test]
    fn anonymous_actions_attributed_to_system() {
        let (trail, _temp) = create_trail();

        let entry = trail
            .record(None, "import", "asset", "CAM001", "Imported", None)
            .unwrap();
        assert_eq!(entry.user_name, "system");
    }

    #[test]
    fn filter_by_action_and_actor() {
        let (trail, _temp) = create_trail();
        let alice = claims("alice");
        let bob = claims("bob");

        trail
            .record(Some(&alice), "checkout", "asset", "CAM001", "-", None)
            .unwrap();
        trail
            .record(Some(&bob), "checkin", "asset", "CAM001", "-", None)
            .unwrap();
        trail
            .record(Some(&alice), "checkin", "asset", "LEN001", "-", None)
            .unwrap();

        let checkins = trail
            .filtered(&AuditFilter {
                action: Some("checkin".to_string()),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(checkins.len(), 2);

        let alices = trail
            .filtered(&AuditFilter {
                actor_contains: Some("ALI".to_string()),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(alices.len(), 2);
    }

    #[test]
    fn details_escape_hatch_round_trips() {
        let (trail, _temp) = create_trail();

        trail
            .record(
                None,
                "bulk_checkout",
                "asset",
                "-",
                "-",
                Some(serde_json::json!({ "count": 3 })),
            )
            .unwrap();

        let entries = trail.entries().unwrap();
        assert_eq!(entries[0].details, Some(serde_json::json!({ "count": 3 })));
    }
}
