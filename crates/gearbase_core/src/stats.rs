//! Usage statistics.
//!
//! Derived entirely from the asset collection and the transaction
//! ledger at read time; nothing here is persisted.

use crate::asset::Asset;
use crate::transaction::TransactionRecord;
use crate::types::TransactionKind;
use std::collections::BTreeMap;

/// Checkout count for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUsage {
    /// Business key.
    pub asset_id: String,
    /// Display name.
    pub asset_name: String,
    /// Number of checkouts in the ledger.
    pub checkouts: usize,
}

/// A point-in-time usage summary.
#[derive(Debug, Clone, Default)]
pub struct UsageReport {
    /// Number of assets on the books.
    pub total_assets: usize,
    /// Assets per lifecycle status.
    pub status_counts: BTreeMap<String, usize>,
    /// Assets per category.
    pub category_counts: BTreeMap<String, usize>,
    /// Checkout transactions in the ledger.
    pub total_checkouts: usize,
    /// Assets ranked by checkout count, busiest first.
    pub most_borrowed: Vec<AssetUsage>,
}

impl UsageReport {
    /// Builds a report from the current asset and ledger snapshots.
    #[must_use]
    pub fn compute(assets: &[Asset], transactions: &[TransactionRecord]) -> Self {
        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
        for asset in assets {
            *status_counts.entry(asset.status.to_string()).or_default() += 1;
            *category_counts.entry(asset.category.clone()).or_default() += 1;
        }

        let mut checkouts_per_asset: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total_checkouts = 0;
        for transaction in transactions {
            if transaction.transaction_type == TransactionKind::Checkout {
                total_checkouts += 1;
                *checkouts_per_asset
                    .entry(transaction.asset_id.as_str())
                    .or_default() += 1;
            }
        }

        let mut most_borrowed: Vec<AssetUsage> = checkouts_per_asset
            .into_iter()
            .map(|(asset_id, checkouts)| AssetUsage {
                asset_id: asset_id.to_string(),
                asset_name: assets
                    .iter()
                    .find(|a| a.asset_id == asset_id)
                    .map(|a| a.asset_name.clone())
                    .unwrap_or_default(),
                checkouts,
            })
            .collect();
        // Busiest first; ties in key order from the BTreeMap.
        most_borrowed.sort_by(|a, b| b.checkouts.cmp(&a.checkouts));

        Self {
            total_assets: assets.len(),
            status_counts,
            category_counts,
            total_checkouts,
            most_borrowed,
        }
    }
}
