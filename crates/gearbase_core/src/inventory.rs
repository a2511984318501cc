//! Inventory facade.

use crate::asset::AssetCatalog;
use crate::audit::AuditTrail;
use crate::error::CoreResult;
use crate::lifecycle::LifecycleEngine;
use crate::maintenance::MaintenanceManager;
use crate::notify::{NoopNotifier, Notifier};
use crate::reservation::ReservationManager;
use crate::stats::UsageReport;
use crate::transaction::TransactionLedger;
use gearbase_store::CollectionStore;
use std::path::Path;
use std::sync::Arc;

/// The main inventory handle.
///
/// `Inventory` wires a collection store to the engines that operate on
/// it. It is the primary entry point for embedding the core:
///
/// ```rust,ignore
/// use gearbase_core::{CheckoutRequest, Inventory, NewAsset};
///
/// let inventory = Inventory::open(Path::new("data"))?;
/// let asset = inventory.assets().create(NewAsset { .. }, Some(&claims))?;
/// inventory.lifecycle().checkout(&asset.asset_id, &request, Some(&claims))?;
/// ```
///
/// Route handlers authenticate with [`gearbase_auth::TokenCodec`] and
/// pass the resulting claims into each operation.
pub struct Inventory {
    store: Arc<CollectionStore>,
    audit: AuditTrail,
    assets: AssetCatalog,
    lifecycle: LifecycleEngine,
    reservations: ReservationManager,
    maintenance: MaintenanceManager,
    ledger: TransactionLedger,
}

impl Inventory {
    /// Opens an inventory over a data directory, with notifications
    /// discarded.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_notifier(path, Arc::new(NoopNotifier))
    }

    /// Opens an inventory with a notification collaborator.
    pub fn open_with_notifier(path: &Path, notifier: Arc<dyn Notifier>) -> CoreResult<Self> {
        let store = Arc::new(CollectionStore::open(path)?);
        let audit = AuditTrail::new(Arc::clone(&store));

        Ok(Self {
            assets: AssetCatalog::new(Arc::clone(&store), audit.clone()),
            lifecycle: LifecycleEngine::new(Arc::clone(&store), audit.clone(), notifier),
            reservations: ReservationManager::new(Arc::clone(&store), audit.clone()),
            maintenance: MaintenanceManager::new(Arc::clone(&store), audit.clone()),
            ledger: TransactionLedger::new(Arc::clone(&store)),
            store,
            audit,
        })
    }

    /// The underlying collection store.
    #[must_use]
    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    /// Asset catalog CRUD.
    #[must_use]
    pub fn assets(&self) -> &AssetCatalog {
        &self.assets
    }

    /// Checkout/checkin state machine.
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleEngine {
        &self.lifecycle
    }

    /// Reservations and conflict detection.
    #[must_use]
    pub fn reservations(&self) -> &ReservationManager {
        &self.reservations
    }

    /// Maintenance issues.
    #[must_use]
    pub fn maintenance(&self) -> &MaintenanceManager {
        &self.maintenance
    }

    /// The transaction ledger.
    #[must_use]
    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    /// The audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Builds a usage report from the current snapshots.
    pub fn usage_report(&self) -> CoreResult<UsageReport> {
        let assets = self.assets.all()?;
        let transactions = self.ledger.all()?;
        Ok(UsageReport::compute(&assets, &transactions))
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("path", &self.store.path())
            .finish_non_exhaustive()
    }
}
