//! # GearBase Core
//!
//! Equipment loan tracking core for GearBase.
//!
//! This crate provides:
//! - Typed views over the flat-file collection store
//! - The asset lifecycle state machine (checkout/checkin/maintenance)
//! - The reservation conflict detector
//! - An append-only transaction ledger and audit trail
//! - Usage statistics derived from the ledger
//!
//! Everything is synchronous and single-process; see
//! [`gearbase_store`] for the persistence and locking model. Route
//! handlers, rendering, and delivery channels are deliberately outside
//! this crate: they authenticate via [`gearbase_auth`], call these
//! operations with validated inputs, and render the returned values.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod audit;
mod codec;
mod error;
mod guard;
mod inventory;
mod lifecycle;
mod maintenance;
mod notify;
mod reservation;
mod stats;
mod transaction;
mod types;

pub use asset::{category_prefix, Asset, AssetCatalog, AssetPatch, NewAsset};
pub use audit::{AuditEntry, AuditFilter, AuditTrail};
pub use error::{CoreError, CoreResult};
pub use inventory::Inventory;
pub use lifecycle::{
    BulkCheckoutError, BulkCheckoutOutcome, CheckinRequest, CheckoutRequest, LifecycleEngine,
    TransitionReceipt,
};
pub use maintenance::{MaintenanceIssue, MaintenanceManager, NewIssue};
pub use notify::{NoopNotifier, Notification, Notifier, NotifyResult};
pub use reservation::{NewReservation, Reservation, ReservationManager};
pub use stats::{AssetUsage, UsageReport};
pub use transaction::{TransactionLedger, TransactionRecord};
pub use types::{
    AssetStatus, Condition, IssueSeverity, IssueStatus, ReservationStatus, TransactionKind,
};

// Identity types appear throughout operation signatures.
pub use gearbase_auth::{Claims, Role};
