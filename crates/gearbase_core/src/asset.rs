//! Typed asset views and catalog CRUD.

use crate::audit::AuditTrail;
use crate::codec::{collections, from_record, to_record};
use crate::error::{CoreError, CoreResult};
use crate::guard::{require_actor, require_admin};
use crate::types::{AssetStatus, Condition};
use chrono::NaiveDate;
use gearbase_auth::Claims;
use gearbase_store::CollectionStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One piece of physical equipment.
///
/// The asset record is the source of truth for current state; the
/// transaction ledger is only its history. Invariant: the loan fields
/// (`current_borrower`, `checkout_date`) are populated iff
/// `status == checked_out`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Business key, `<category-prefix><zero-padded sequence>`.
    pub asset_id: String,
    /// Display name.
    pub asset_name: String,
    /// Category, drives the business-key prefix.
    #[serde(default)]
    pub category: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Manufacturer serial, if known.
    #[serde(default)]
    pub serial_number: String,
    /// Lifecycle status.
    pub status: AssetStatus,
    /// Borrower while checked out.
    #[serde(default)]
    pub current_borrower: Option<String>,
    /// Checkout stamp while checked out.
    #[serde(default)]
    pub checkout_date: Option<String>,
    /// Agreed return date while checked out.
    #[serde(default)]
    pub expected_return_date: Option<NaiveDate>,
    /// Project while checked out.
    #[serde(default)]
    pub current_project: Option<String>,
    /// Stamp of the most recent checkin.
    #[serde(default)]
    pub last_returned_date: Option<String>,
    /// Condition as of the most recent report.
    #[serde(default)]
    pub condition_status: Condition,
    /// Where the asset lives when available.
    #[serde(default)]
    pub storage_location: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
    /// Number of completed checkouts, monotonically increasing.
    #[serde(default)]
    pub total_checkouts: u64,
    /// Fields this view does not model (store id, timestamps, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for creating an asset.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    /// Display name (required).
    pub asset_name: String,
    /// Category; empty means `Other`.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Manufacturer serial.
    pub serial_number: String,
    /// Initial condition.
    pub condition_status: Condition,
    /// Storage location.
    pub storage_location: String,
    /// Free-text notes.
    pub notes: String,
}

/// Partial update for an asset; only set fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New serial number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// New condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_status: Option<Condition>,
    /// New storage location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Status override, e.g. marking an asset `lost`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
}

/// Maps a category to its business-key prefix.
#[must_use]
pub fn category_prefix(category: &str) -> &'static str {
    match category {
        "Camera" => "CAM",
        "Lens" => "LEN",
        "Audio" => "AUD",
        "Lighting" => "LIT",
        "Storage" => "STO",
        "Monitor" => "MON",
        "Tripod" => "TRI",
        "Cables" => "CAB",
        _ => "OTH",
    }
}

/// CRUD over the asset collection.
#[derive(Clone)]
pub struct AssetCatalog {
    store: Arc<CollectionStore>,
    audit: AuditTrail,
}

impl AssetCatalog {
    /// Creates a catalog over the given store.
    pub fn new(store: Arc<CollectionStore>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    /// Returns all assets, sorted by name (case-insensitive).
    pub fn all(&self) -> CoreResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = self
            .store
            .get_all(collections::ASSETS)?
            .into_iter()
            .map(|r| from_record(collections::ASSETS, r))
            .collect::<CoreResult<_>>()?;
        assets.sort_by(|a, b| {
            a.asset_name
                .to_lowercase()
                .cmp(&b.asset_name.to_lowercase())
        });
        Ok(assets)
    }

    /// Finds an asset by business key.
    pub fn find(&self, asset_id: &str) -> CoreResult<Option<Asset>> {
        self.store
            .find(collections::ASSETS, "asset_id", &Value::from(asset_id))?
            .map(|r| from_record(collections::ASSETS, r))
            .transpose()
    }

    /// Returns an asset by business key, or `NotFound`.
    pub fn get(&self, asset_id: &str) -> CoreResult<Asset> {
        self.find(asset_id)?
            .ok_or_else(|| CoreError::not_found("asset", asset_id))
    }

    /// Creates an asset with the next business key for its category.
    pub fn create(&self, input: NewAsset, actor: Option<&Claims>) -> CoreResult<Asset> {
        let actor = require_actor(actor)?;
        if input.asset_name.trim().is_empty() {
            return Err(CoreError::validation("asset name is required"));
        }

        let category = if input.category.is_empty() {
            "Other".to_string()
        } else {
            input.category
        };
        let asset_id = self.next_asset_id(&category)?;

        let asset = Asset {
            asset_id: asset_id.clone(),
            asset_name: input.asset_name,
            category,
            description: input.description,
            serial_number: input.serial_number,
            status: AssetStatus::Available,
            current_borrower: None,
            checkout_date: None,
            expected_return_date: None,
            current_project: None,
            last_returned_date: None,
            condition_status: input.condition_status,
            storage_location: input.storage_location,
            notes: input.notes,
            total_checkouts: 0,
            extra: Map::new(),
        };

        let record = to_record(collections::ASSETS, &asset)?;
        let stored = self.store.insert(collections::ASSETS, record)?;
        let stored: Asset = from_record(collections::ASSETS, stored)?;

        self.audit.record(
            Some(actor),
            "create",
            "asset",
            &asset_id,
            format!("Created asset {}", stored.asset_name),
            None,
        )?;
        Ok(stored)
    }

    /// Merge-updates an asset's descriptive fields.
    pub fn update(
        &self,
        asset_id: &str,
        patch: AssetPatch,
        actor: Option<&Claims>,
    ) -> CoreResult<Asset> {
        let actor = require_actor(actor)?;

        let patch_record = to_record(collections::ASSETS, &patch)?;
        let updated = self
            .store
            .update(
                collections::ASSETS,
                "asset_id",
                &Value::from(asset_id),
                patch_record,
            )?
            .ok_or_else(|| CoreError::not_found("asset", asset_id))?;
        let updated: Asset = from_record(collections::ASSETS, updated)?;

        self.audit.record(
            Some(actor),
            "update",
            "asset",
            asset_id,
            format!("Updated asset {}", updated.asset_name),
            None,
        )?;
        Ok(updated)
    }

    /// Deletes an asset. Admin only.
    pub fn delete(&self, asset_id: &str, actor: Option<&Claims>) -> CoreResult<()> {
        let actor = require_admin(actor)?;

        let removed = self
            .store
            .delete(collections::ASSETS, "asset_id", &Value::from(asset_id))?;
        if !removed {
            return Err(CoreError::not_found("asset", asset_id));
        }

        self.audit.record(
            Some(actor),
            "delete",
            "asset",
            asset_id,
            format!("Deleted asset {asset_id}"),
            None,
        )?;
        Ok(())
    }

    /// Case-insensitive search over name, business key, and serial.
    pub fn search(&self, query: &str) -> CoreResult<Vec<Asset>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();
        Ok(self
            .all()?
            .into_iter()
            .filter(|a| {
                a.asset_name.to_lowercase().contains(&needle)
                    || a.asset_id.to_lowercase().contains(&needle)
                    || a.serial_number.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Returns assets with the given status.
    pub fn by_status(&self, status: AssetStatus) -> CoreResult<Vec<Asset>> {
        Ok(self.all()?.into_iter().filter(|a| a.status == status).collect())
    }

    /// Returns assets in the given category.
    pub fn by_category(&self, category: &str) -> CoreResult<Vec<Asset>> {
        Ok(self.all()?.into_iter().filter(|a| a.category == category).collect())
    }

    /// Assigns the next business key for a category prefix.
    fn next_asset_id(&self, category: &str) -> CoreResult<String> {
        let prefix = category_prefix(category);
        let records = self.store.get_all(collections::ASSETS)?;

        let max_seq = records
            .iter()
            .filter_map(|r| r.get_str("asset_id"))
            .filter_map(|id| id.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        Ok(format!("{prefix}{:03}", max_seq + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearbase_auth::Role;
    use tempfile::{tempdir, TempDir};

    fn create_catalog() -> (AssetCatalog, TempDir) {
        let temp = tempdir().unwrap();
        let store = Arc::new(CollectionStore::open(temp.path()).unwrap());
        let audit = AuditTrail::new(Arc::clone(&store));
        (AssetCatalog::new(store, audit), temp)
    }

    fn claims(role: Role) -> Claims {
        Claims {
            user_id: 1,
            username: "tester".to_string(),
            role,
            exp: u64::MAX,
        }
    }

    fn camera(catalog: &AssetCatalog, name: &str) -> Asset {
        catalog
            .create(
                NewAsset {
                    asset_name: name.to_string(),
                    category: "Camera".to_string(),
                    ..NewAsset::default()
                },
                Some(&claims(Role::EquipmentManager)),
            )
            .unwrap()
    }

    #[test]
    fn business_keys_are_sequential_per_category() {
        let (catalog, _temp) = create_catalog();

        assert_eq!(camera(&catalog, "A7").asset_id, "CAM001");
        assert_eq!(camera(&catalog, "FX3").asset_id, "CAM002");

        let tripod = catalog
            .create(
                NewAsset {
                    asset_name: "Carbon".to_string(),
                    category: "Tripod".to_string(),
                    ..NewAsset::default()
                },
                Some(&claims(Role::Admin)),
            )
            .unwrap();
        assert_eq!(tripod.asset_id, "TRI001");
    }

    #[test]
    fn unknown_category_gets_oth_prefix() {
        let (catalog, _temp) = create_catalog();

        let asset = catalog
            .create(
                NewAsset {
                    asset_name: "Mystery box".to_string(),
                    category: "Gadget".to_string(),
                    ..NewAsset::default()
                },
                Some(&claims(Role::Admin)),
            )
            .unwrap();
        assert_eq!(asset.asset_id, "OTH001");
    }

    #[test]
    fn create_requires_identity_and_name() {
        let (catalog, _temp) = create_catalog();

        let anonymous = catalog.create(NewAsset::default(), None);
        assert!(matches!(anonymous, Err(CoreError::Unauthorized)));

        let unnamed = catalog.create(NewAsset::default(), Some(&claims(Role::Admin)));
        assert!(matches!(unnamed, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn new_assets_start_available() {
        let (catalog, _temp) = create_catalog();
        let asset = camera(&catalog, "A7");

        assert_eq!(asset.status, AssetStatus::Available);
        assert!(asset.current_borrower.is_none());
        assert_eq!(asset.total_checkouts, 0);
    }

    #[test]
    fn update_merges_and_keeps_unmodeled_fields() {
        let (catalog, _temp) = create_catalog();
        camera(&catalog, "A7");

        let updated = catalog
            .update(
                "CAM001",
                AssetPatch {
                    notes: Some("scratched".to_string()),
                    ..AssetPatch::default()
                },
                Some(&claims(Role::TeamMember)),
            )
            .unwrap();

        assert_eq!(updated.notes, "scratched");
        assert_eq!(updated.asset_name, "A7");
        // Store-assigned fields survive the merge.
        assert!(updated.extra.contains_key("created_at"));
    }

    #[test]
    fn delete_is_admin_only() {
        let (catalog, _temp) = create_catalog();
        camera(&catalog, "A7");

        let member = catalog.delete("CAM001", Some(&claims(Role::TeamMember)));
        assert!(matches!(member, Err(CoreError::Forbidden { .. })));

        let manager = catalog.delete("CAM001", Some(&claims(Role::EquipmentManager)));
        assert!(matches!(manager, Err(CoreError::Forbidden { .. })));

        catalog.delete("CAM001", Some(&claims(Role::Admin))).unwrap();
        assert!(catalog.find("CAM001").unwrap().is_none());
    }

    #[test]
    fn search_matches_name_key_and_serial() {
        let (catalog, _temp) = create_catalog();
        camera(&catalog, "Sony A7");
        catalog
            .create(
                NewAsset {
                    asset_name: "Shotgun mic".to_string(),
                    category: "Audio".to_string(),
                    serial_number: "SN-778".to_string(),
                    ..NewAsset::default()
                },
                Some(&claims(Role::Admin)),
            )
            .unwrap();

        assert_eq!(catalog.search("sony").unwrap().len(), 1);
        assert_eq!(catalog.search("aud001").unwrap().len(), 1);
        assert_eq!(catalog.search("778").unwrap().len(), 1);
        assert!(catalog.search("").unwrap().is_empty());
    }

    #[test]
    fn listing_is_sorted_by_name() {
        let (catalog, _temp) = create_catalog();
        camera(&catalog, "Zoom recorder");
        camera(&catalog, "alpha body");

        let names: Vec<String> = catalog
            .all()
            .unwrap()
            .into_iter()
            .map(|a| a.asset_name)
            .collect();
        assert_eq!(names, vec!["alpha body", "Zoom recorder"]);
    }
}
