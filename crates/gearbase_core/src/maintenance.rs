//! Maintenance issue tracking.
//!
//! Issues have their own lifecycle (`open → in_progress →
//! resolved/closed`), independent of the asset's. Reporting at `high` or
//! `critical` severity pulls the referenced asset into `maintenance` as a
//! side effect.

use crate::audit::AuditTrail;
use crate::codec::{collections, from_record, to_record};
use crate::error::{CoreError, CoreResult};
use crate::guard::require_actor;
use crate::types::{IssueSeverity, IssueStatus};
use gearbase_auth::Claims;
use gearbase_store::{now_stamp, CollectionStore, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One reported equipment problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceIssue {
    /// Store-assigned numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Business key of the affected asset.
    pub asset_id: String,
    /// Asset name at report time, denormalized for listings.
    #[serde(default)]
    pub asset_name: String,
    /// What is wrong.
    pub description: String,
    /// How bad it is.
    pub severity: IssueSeverity,
    /// Where the issue is in its lifecycle.
    pub status: IssueStatus,
    /// Who reported it.
    #[serde(default)]
    pub reported_by: String,
    /// Stamp of resolution or closure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    /// Fields this view does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for reporting an issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Business key of the affected asset.
    pub asset_id: String,
    /// What is wrong (required).
    pub description: String,
    /// How bad it is.
    pub severity: IssueSeverity,
}

/// Reports issues and tracks their lifecycle.
#[derive(Clone)]
pub struct MaintenanceManager {
    store: Arc<CollectionStore>,
    audit: AuditTrail,
}

impl MaintenanceManager {
    /// Creates a manager over the given store.
    pub fn new(store: Arc<CollectionStore>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    /// Reports a new issue against an asset.
    ///
    /// Severity `high` or `critical` forces the asset's status to
    /// `maintenance`, independent of the issue's own lifecycle.
    pub fn report(&self, input: NewIssue, actor: Option<&Claims>) -> CoreResult<MaintenanceIssue> {
        let actor = require_actor(actor)?;
        if input.description.trim().is_empty() {
            return Err(CoreError::validation("issue description is required"));
        }

        let asset = self
            .store
            .find(collections::ASSETS, "asset_id", &Value::from(input.asset_id.as_str()))?
            .ok_or_else(|| CoreError::not_found("asset", input.asset_id.as_str()))?;
        let asset_name = asset.get_str("asset_name").unwrap_or_default().to_string();

        let issue = MaintenanceIssue {
            id: None,
            asset_id: input.asset_id.clone(),
            asset_name,
            description: input.description,
            severity: input.severity,
            status: IssueStatus::Open,
            reported_by: actor.username.clone(),
            resolved_at: None,
            extra: Map::new(),
        };
        let record = to_record(collections::MAINTENANCE_ISSUES, &issue)?;
        let stored = self.store.insert(collections::MAINTENANCE_ISSUES, record)?;
        let stored: MaintenanceIssue = from_record(collections::MAINTENANCE_ISSUES, stored)?;

        if input.severity.grounds_asset() {
            let mut patch = Record::new();
            patch.set("status", "maintenance");
            self.store.update(
                collections::ASSETS,
                "asset_id",
                &Value::from(input.asset_id.as_str()),
                patch,
            )?;
        }

        self.audit.record(
            Some(actor),
            "maintenance",
            "asset",
            &input.asset_id,
            format!(
                "Reported {} issue: {}",
                stored.severity_label(),
                stored.description
            ),
            None,
        )?;
        Ok(stored)
    }

    /// Moves an issue through its lifecycle.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidState`] if the issue is already resolved or
    /// closed.
    pub fn transition(
        &self,
        id: u64,
        status: IssueStatus,
        actor: Option<&Claims>,
    ) -> CoreResult<MaintenanceIssue> {
        let actor = require_actor(actor)?;

        let current = self.get(id)?;
        if current.status.is_terminal() {
            return Err(CoreError::invalid_state(format!(
                "issue {id} is already {:?}",
                current.status
            )));
        }

        let mut patch = Record::new();
        patch.set(
            "status",
            serde_json::to_value(status)
                .unwrap_or(Value::Null),
        );
        if status.is_terminal() {
            patch.set("resolved_at", now_stamp());
        }
        let updated = self
            .store
            .update_by_id(collections::MAINTENANCE_ISSUES, id, patch)?
            .ok_or_else(|| CoreError::not_found("maintenance issue", id.to_string()))?;
        let updated: MaintenanceIssue = from_record(collections::MAINTENANCE_ISSUES, updated)?;

        self.audit.record(
            Some(actor),
            "maintenance",
            "asset",
            &updated.asset_id,
            format!("Issue {id} moved to {:?}", status),
            None,
        )?;
        Ok(updated)
    }

    /// Returns an issue by id, or `NotFound`.
    pub fn get(&self, id: u64) -> CoreResult<MaintenanceIssue> {
        self.store
            .find_by_id(collections::MAINTENANCE_ISSUES, id)?
            .map(|r| from_record(collections::MAINTENANCE_ISSUES, r))
            .transpose()?
            .ok_or_else(|| CoreError::not_found("maintenance issue", id.to_string()))
    }

    /// Returns all issues, most severe first.
    pub fn all(&self) -> CoreResult<Vec<MaintenanceIssue>> {
        let mut issues: Vec<MaintenanceIssue> = self
            .store
            .get_all(collections::MAINTENANCE_ISSUES)?
            .into_iter()
            .map(|r| from_record(collections::MAINTENANCE_ISSUES, r))
            .collect::<CoreResult<_>>()?;
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(issues)
    }

    /// Returns issues that are still open or in progress.
    pub fn open_issues(&self) -> CoreResult<Vec<MaintenanceIssue>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|i| !i.status.is_terminal())
            .collect())
    }

    /// Returns one asset's issues.
    pub fn for_asset(&self, asset_id: &str) -> CoreResult<Vec<MaintenanceIssue>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|i| i.asset_id == asset_id)
            .collect())
    }
}

impl MaintenanceIssue {
    fn severity_label(&self) -> &'static str {
        match self.severity {
            IssueSeverity::Low => "low",
            IssueSeverity::Medium => "medium",
            IssueSeverity::High => "high",
            IssueSeverity::Critical => "critical",
        }
    }
}
