//! The asset lifecycle state machine.
//!
//! Transitions over `status ∈ {available, checked_out, maintenance,
//! lost}`. Every transition updates the asset record first (source of
//! truth), then appends the ledger transaction, then the audit entry.
//! A crash between those writes can lose log entries but never leaves
//! the asset itself in an illegal state.

use crate::asset::{Asset, AssetCatalog};
use crate::audit::AuditTrail;
use crate::codec::{collections, from_record, short_key};
use crate::error::{CoreError, CoreResult};
use crate::guard::require_actor;
use crate::notify::{dispatch, Notification, Notifier};
use crate::transaction::{TransactionLedger, TransactionRecord};
use crate::types::{AssetStatus, Condition, TransactionKind};
use chrono::NaiveDate;
use gearbase_auth::Claims;
use gearbase_store::{now_stamp, CollectionStore, Record};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// Inputs for a checkout transition.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    /// Who takes the asset (required, non-empty).
    pub borrower_name: String,
    /// Agreed return date.
    pub expected_return_date: Option<NaiveDate>,
    /// Project the loan is for.
    pub project: Option<String>,
    /// Purpose free text.
    pub purpose: Option<String>,
    /// Free-text notes, recorded on the transaction.
    pub notes: Option<String>,
}

/// Inputs for a checkin transition.
#[derive(Debug, Clone, Default)]
pub struct CheckinRequest {
    /// Condition reported at return.
    pub condition: Condition,
    /// Free-text notes, recorded on the transaction.
    pub notes: Option<String>,
}

/// A committed transition: the updated asset and its ledger entry.
#[derive(Debug, Clone)]
pub struct TransitionReceipt {
    /// The asset after the transition.
    pub asset: Asset,
    /// The ledger entry the transition appended.
    pub transaction: TransactionRecord,
}

/// One failed item of a bulk checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCheckoutError {
    /// Business key of the asset that failed.
    pub asset_id: String,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of a bulk checkout: partial success by design.
#[derive(Debug)]
pub struct BulkCheckoutOutcome {
    /// Assets that were checked out.
    pub checked_out: Vec<Asset>,
    /// Items that failed, in input order.
    pub errors: Vec<BulkCheckoutError>,
}

impl BulkCheckoutOutcome {
    /// Number of items that succeeded.
    #[must_use]
    pub fn checked_out_count(&self) -> usize {
        self.checked_out.len()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }
}

/// Enforces legal asset state transitions and their side effects.
pub struct LifecycleEngine {
    store: Arc<CollectionStore>,
    catalog: AssetCatalog,
    ledger: TransactionLedger,
    audit: AuditTrail,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleEngine {
    /// Creates an engine over the given store.
    pub fn new(store: Arc<CollectionStore>, audit: AuditTrail, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            catalog: AssetCatalog::new(Arc::clone(&store), audit.clone()),
            ledger: TransactionLedger::new(Arc::clone(&store)),
            store,
            audit,
            notifier,
        }
    }

    /// Checks an available asset out to a borrower.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the borrower name is empty
    /// - [`CoreError::NotFound`] if the asset does not exist
    /// - [`CoreError::InvalidState`] if the asset is not `available`;
    ///   the asset is not mutated
    pub fn checkout(
        &self,
        asset_id: &str,
        request: &CheckoutRequest,
        actor: Option<&Claims>,
    ) -> CoreResult<TransitionReceipt> {
        let actor = require_actor(actor)?;
        let receipt = self.checkout_one(asset_id, request, actor)?;

        dispatch(
            self.notifier.as_ref(),
            Notification::CheckedOut {
                asset: &receipt.asset,
                borrower: &request.borrower_name,
                expected_return: request.expected_return_date,
            },
        );
        Ok(receipt)
    }

    /// Checks a borrowed asset back in.
    ///
    /// The asset returns to `available`, or goes to `maintenance` when
    /// the reported condition is `needs_repair`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidState`] if the asset is not currently
    /// `checked_out`.
    pub fn checkin(
        &self,
        asset_id: &str,
        request: &CheckinRequest,
        actor: Option<&Claims>,
    ) -> CoreResult<TransitionReceipt> {
        let actor = require_actor(actor)?;

        let asset = self.catalog.get(asset_id)?;
        if asset.status != AssetStatus::CheckedOut {
            return Err(CoreError::invalid_state(format!(
                "asset {asset_id} is not checked out"
            )));
        }
        let borrower = asset.current_borrower.clone().unwrap_or_default();

        let new_status = if request.condition == Condition::NeedsRepair {
            AssetStatus::Maintenance
        } else {
            AssetStatus::Available
        };

        let mut patch = Record::new();
        patch.set("status", new_status.as_str());
        patch.set("current_borrower", Value::Null);
        patch.set("checkout_date", Value::Null);
        patch.set("expected_return_date", Value::Null);
        patch.set("current_project", Value::Null);
        patch.set("last_returned_date", now_stamp());
        patch.set("condition_status", request.condition.as_str());
        let updated = self.apply_patch(asset_id, patch)?;

        let transaction = self.ledger.append(&TransactionRecord {
            transaction_id: short_key("TXN"),
            asset_id: asset_id.to_string(),
            asset_name: asset.asset_name.clone(),
            borrower_name: borrower.clone(),
            transaction_type: TransactionKind::Checkin,
            project: None,
            purpose: None,
            notes: request.notes.clone(),
            condition_on_return: Some(request.condition),
            transaction_date: now_stamp(),
            extra: Map::new(),
        })?;

        self.audit.record(
            Some(actor),
            "checkin",
            "asset",
            asset_id,
            format!("Returned by {borrower}, condition: {}", request.condition),
            None,
        )?;
        info!(asset_id, status = %new_status, "asset checked in");

        dispatch(
            self.notifier.as_ref(),
            Notification::CheckedIn {
                asset: &updated,
                borrower: &borrower,
                condition: request.condition,
            },
        );

        Ok(TransitionReceipt {
            asset: updated,
            transaction,
        })
    }

    /// Checks several assets out to one borrower.
    ///
    /// Each id is evaluated independently: failures are collected and do
    /// not abort the remaining ids. Never all-or-nothing.
    pub fn bulk_checkout(
        &self,
        asset_ids: &[String],
        request: &CheckoutRequest,
        actor: Option<&Claims>,
    ) -> CoreResult<BulkCheckoutOutcome> {
        let actor = require_actor(actor)?;
        if asset_ids.is_empty() {
            return Err(CoreError::validation("no assets selected"));
        }
        if request.borrower_name.trim().is_empty() {
            return Err(CoreError::validation("borrower name is required"));
        }

        let mut checked_out = Vec::new();
        let mut errors = Vec::new();
        for asset_id in asset_ids {
            match self.checkout_one(asset_id, request, actor) {
                Ok(receipt) => checked_out.push(receipt.asset),
                Err(e) => errors.push(BulkCheckoutError {
                    asset_id: asset_id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if !checked_out.is_empty() {
            dispatch(
                self.notifier.as_ref(),
                Notification::BulkCheckedOut {
                    assets: &checked_out,
                    borrower: &request.borrower_name,
                },
            );
        }

        Ok(BulkCheckoutOutcome {
            checked_out,
            errors,
        })
    }

    /// Returns checked-out assets whose agreed return date is before
    /// `as_of`.
    pub fn overdue(&self, as_of: NaiveDate) -> CoreResult<Vec<Asset>> {
        Ok(self
            .catalog
            .all()?
            .into_iter()
            .filter(|a| {
                a.status == AssetStatus::CheckedOut
                    && a.expected_return_date.is_some_and(|d| d < as_of)
            })
            .collect())
    }

    /// The checkout transition without notification dispatch.
    fn checkout_one(
        &self,
        asset_id: &str,
        request: &CheckoutRequest,
        actor: &Claims,
    ) -> CoreResult<TransitionReceipt> {
        if request.borrower_name.trim().is_empty() {
            return Err(CoreError::validation("borrower name is required"));
        }

        let asset = self.catalog.get(asset_id)?;
        if asset.status != AssetStatus::Available {
            return Err(CoreError::invalid_state(format!(
                "asset {asset_id} ({}) is not available",
                asset.asset_name
            )));
        }

        let mut patch = Record::new();
        patch.set("status", AssetStatus::CheckedOut.as_str());
        patch.set("current_borrower", request.borrower_name.clone());
        patch.set("checkout_date", now_stamp());
        patch.set(
            "expected_return_date",
            request
                .expected_return_date
                .map_or(Value::Null, |d| Value::from(d.to_string())),
        );
        patch.set(
            "current_project",
            request.project.clone().map_or(Value::Null, Value::from),
        );
        patch.set("total_checkouts", asset.total_checkouts + 1);
        let updated = self.apply_patch(asset_id, patch)?;

        let transaction = self.ledger.append(&TransactionRecord {
            transaction_id: short_key("TXN"),
            asset_id: asset_id.to_string(),
            asset_name: asset.asset_name.clone(),
            borrower_name: request.borrower_name.clone(),
            transaction_type: TransactionKind::Checkout,
            project: request.project.clone(),
            purpose: request.purpose.clone(),
            notes: request.notes.clone(),
            condition_on_return: None,
            transaction_date: now_stamp(),
            extra: Map::new(),
        })?;

        let project_note = request
            .project
            .as_ref()
            .map_or_else(String::new, |p| format!(" for project: {p}"));
        self.audit.record(
            Some(actor),
            "checkout",
            "asset",
            asset_id,
            format!("Checked out to {}{project_note}", request.borrower_name),
            None,
        )?;
        info!(asset_id, borrower = %request.borrower_name, "asset checked out");

        Ok(TransitionReceipt {
            asset: updated,
            transaction,
        })
    }

    /// Applies a patch to an asset record and returns the typed result.
    fn apply_patch(&self, asset_id: &str, patch: Record) -> CoreResult<Asset> {
        let updated = self
            .store
            .update(
                collections::ASSETS,
                "asset_id",
                &Value::from(asset_id),
                patch,
            )?
            .ok_or_else(|| CoreError::not_found("asset", asset_id))?;
        from_record(collections::ASSETS, updated)
    }
}
