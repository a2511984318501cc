//! The checkout/checkin ledger.
//!
//! Transactions are an immutable, append-only side effect of lifecycle
//! transitions: the asset record is the source of truth for current
//! state, the ledger is its history. There is no update or delete here.

use crate::codec::{collections, from_record, to_record};
use crate::error::CoreResult;
use crate::types::{Condition, TransactionKind};
use gearbase_store::CollectionStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One ledger entry, written when an asset changes hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Generated key, `TXN-` prefixed.
    pub transaction_id: String,
    /// Business key of the asset.
    pub asset_id: String,
    /// Asset name at transaction time, denormalized for reporting.
    #[serde(default)]
    pub asset_name: String,
    /// Who took or returned the asset.
    pub borrower_name: String,
    /// Checkout or checkin.
    pub transaction_type: TransactionKind,
    /// Project the loan is for, if given at checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Purpose free text, if given at checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Condition reported at checkin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_on_return: Option<Condition>,
    /// When the transaction happened.
    pub transaction_date: String,
    /// Fields this view does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Appends to and reads the transaction ledger.
#[derive(Clone)]
pub struct TransactionLedger {
    store: Arc<CollectionStore>,
}

impl TransactionLedger {
    /// Creates a ledger over the given store.
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Appends one transaction. Internal to lifecycle transitions.
    pub(crate) fn append(&self, transaction: &TransactionRecord) -> CoreResult<TransactionRecord> {
        let record = to_record(collections::TRANSACTIONS, transaction)?;
        let stored = self.store.insert(collections::TRANSACTIONS, record)?;
        from_record(collections::TRANSACTIONS, stored)
    }

    /// Returns the full ledger in append order.
    pub fn all(&self) -> CoreResult<Vec<TransactionRecord>> {
        self.store
            .get_all(collections::TRANSACTIONS)?
            .into_iter()
            .map(|r| from_record(collections::TRANSACTIONS, r))
            .collect()
    }

    /// Returns one asset's transactions in append order.
    pub fn for_asset(&self, asset_id: &str) -> CoreResult<Vec<TransactionRecord>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|t| t.asset_id == asset_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::short_key;
    use gearbase_store::now_stamp;
    use tempfile::{tempdir, TempDir};

    fn create_ledger() -> (TransactionLedger, TempDir) {
        let temp = tempdir().unwrap();
        let store = Arc::new(CollectionStore::open(temp.path()).unwrap());
        (TransactionLedger::new(store), temp)
    }

    fn checkout_of(asset_id: &str, borrower: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_id: short_key("TXN"),
            asset_id: asset_id.to_string(),
            asset_name: String::new(),
            borrower_name: borrower.to_string(),
            transaction_type: TransactionKind::Checkout,
            project: None,
            purpose: None,
            notes: None,
            condition_on_return: None,
            transaction_date: now_stamp(),
            extra: Map::new(),
        }
    }

    #[test]
    fn append_and_read_back() {
        let (ledger, _temp) = create_ledger();

        let stored = ledger.append(&checkout_of("CAM001", "Alice")).unwrap();
        assert!(stored.transaction_id.starts_with("TXN-"));

        let all = ledger.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].borrower_name, "Alice");
    }

    #[test]
    fn for_asset_filters() {
        let (ledger, _temp) = create_ledger();

        ledger.append(&checkout_of("CAM001", "Alice")).unwrap();
        ledger.append(&checkout_of("LEN001", "Bob")).unwrap();
        ledger.append(&checkout_of("CAM001", "Carol")).unwrap();

        let cam = ledger.for_asset("CAM001").unwrap();
        assert_eq!(cam.len(), 2);
        assert!(cam.iter().all(|t| t.asset_id == "CAM001"));
    }
}
