//! Reservations and the conflict detector.
//!
//! A reservation blocks its asset for an inclusive date interval. Two
//! reservations for the same asset may overlap only if at least one of
//! them is cancelled or rejected. Admission at creation time is the
//! single enforcement point: approval does not re-check for conflicts
//! that appeared between request and approval.

use crate::audit::AuditTrail;
use crate::codec::{collections, from_record, short_key, to_record};
use crate::error::{CoreError, CoreResult};
use crate::guard::{require_actor, require_manager};
use crate::types::ReservationStatus;
use chrono::NaiveDate;
use gearbase_auth::Claims;
use gearbase_store::{now_stamp, CollectionStore, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// One reservation of an asset for a date interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Generated key, `REQ-` prefixed.
    pub id: String,
    /// Business key of the reserved asset.
    pub asset_id: String,
    /// Asset name at creation time, denormalized for listings.
    #[serde(default)]
    pub asset_name: String,
    /// Who the asset is reserved for.
    pub reserved_by: String,
    /// First blocked day (inclusive).
    pub start_date: NaiveDate,
    /// Last blocked day (inclusive).
    pub end_date: NaiveDate,
    /// Purpose free text.
    #[serde(default)]
    pub purpose: String,
    /// Request status.
    pub status: ReservationStatus,
    /// Who created the request.
    #[serde(default)]
    pub created_by: String,
    /// Manager who approved, once approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// Approval stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    /// Manager who rejected, once rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    /// Rejection stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<String>,
    /// Why the request was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Who cancelled, once cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    /// Cancellation stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
    /// Fields this view does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for creating a reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    /// Business key of the asset to reserve.
    pub asset_id: String,
    /// Who the reservation is for; defaults to the requesting user.
    pub reserved_by: Option<String>,
    /// First blocked day (inclusive).
    pub start_date: NaiveDate,
    /// Last blocked day (inclusive).
    pub end_date: NaiveDate,
    /// Purpose free text.
    pub purpose: String,
}

/// Creates reservations and guards their status transitions.
#[derive(Clone)]
pub struct ReservationManager {
    store: Arc<CollectionStore>,
    audit: AuditTrail,
}

impl ReservationManager {
    /// Creates a manager over the given store.
    pub fn new(store: Arc<CollectionStore>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    /// Returns all reservations in creation order.
    pub fn all(&self) -> CoreResult<Vec<Reservation>> {
        self.store
            .get_all(collections::RESERVATIONS)?
            .into_iter()
            .map(|r| from_record(collections::RESERVATIONS, r))
            .collect()
    }

    /// Returns the reservations an identity may see: managers see all,
    /// team members only their own.
    pub fn visible_to(&self, actor: &Claims) -> CoreResult<Vec<Reservation>> {
        let reservations = self.all()?;
        if actor.role.is_manager() {
            return Ok(reservations);
        }
        let username = actor.username.to_lowercase();
        Ok(reservations
            .into_iter()
            .filter(|r| r.reserved_by.to_lowercase() == username)
            .collect())
    }

    /// Finds a reservation by key.
    pub fn find(&self, id: &str) -> CoreResult<Option<Reservation>> {
        self.store
            .find(collections::RESERVATIONS, "id", &Value::from(id))?
            .map(|r| from_record(collections::RESERVATIONS, r))
            .transpose()
    }

    /// Returns a reservation by key, or `NotFound`.
    pub fn get(&self, id: &str) -> CoreResult<Reservation> {
        self.find(id)?
            .ok_or_else(|| CoreError::not_found("reservation", id))
    }

    /// Returns true if the interval overlaps any active reservation for
    /// the asset.
    ///
    /// The interval is inclusive on both ends: a reservation ending the
    /// day another begins is a conflict. Cancelled and rejected
    /// reservations never block. `excluding` skips one reservation key,
    /// for checks on behalf of an existing reservation.
    pub fn has_conflict(
        &self,
        asset_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        excluding: Option<&str>,
    ) -> CoreResult<bool> {
        Ok(self.all()?.iter().any(|existing| {
            existing.asset_id == asset_id
                && !existing.status.is_inactive()
                && excluding != Some(existing.id.as_str())
                && start <= existing.end_date
                && end >= existing.start_date
        }))
    }

    /// Creates a reservation if the interval is free.
    ///
    /// Managers create `confirmed` reservations directly; team members
    /// create `pending` requests. On conflict nothing is persisted.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the end date precedes the start
    /// - [`CoreError::NotFound`] if the asset does not exist
    /// - [`CoreError::Conflict`] if the interval overlaps an active
    ///   reservation
    pub fn request(
        &self,
        input: NewReservation,
        actor: Option<&Claims>,
    ) -> CoreResult<Reservation> {
        let actor = require_actor(actor)?;

        if input.end_date < input.start_date {
            return Err(CoreError::validation("end date must be after start date"));
        }

        let asset = self
            .store
            .find(collections::ASSETS, "asset_id", &Value::from(input.asset_id.as_str()))?
            .ok_or_else(|| CoreError::not_found("asset", input.asset_id.as_str()))?;
        let asset_name = asset.get_str("asset_name").unwrap_or_default().to_string();

        if self.has_conflict(&input.asset_id, input.start_date, input.end_date, None)? {
            return Err(CoreError::conflict(format!(
                "asset {} is already reserved between {} and {}",
                input.asset_id, input.start_date, input.end_date
            )));
        }

        let status = if actor.role.is_manager() {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };
        let reservation = Reservation {
            id: short_key("REQ"),
            asset_id: input.asset_id,
            asset_name: asset_name.clone(),
            reserved_by: input
                .reserved_by
                .unwrap_or_else(|| actor.username.clone()),
            start_date: input.start_date,
            end_date: input.end_date,
            purpose: input.purpose,
            status,
            created_by: actor.username.clone(),
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            extra: Map::new(),
        };

        let record = to_record(collections::RESERVATIONS, &reservation)?;
        let stored = self.store.insert(collections::RESERVATIONS, record)?;
        let stored: Reservation = from_record(collections::RESERVATIONS, stored)?;

        let kind = match status {
            ReservationStatus::Pending => "Gear request",
            _ => "Reservation",
        };
        self.audit.record(
            Some(actor),
            "reservation",
            "reservation",
            &stored.id,
            format!(
                "{kind}: {asset_name} for {} ({} to {})",
                stored.reserved_by, stored.start_date, stored.end_date
            ),
            None,
        )?;
        info!(reservation = %stored.id, asset_id = %stored.asset_id, status = ?status, "reservation created");

        Ok(stored)
    }

    /// Approves a pending request. Manager only.
    ///
    /// No overlap re-validation happens here; the interval was admitted
    /// at creation time.
    pub fn approve(&self, id: &str, actor: Option<&Claims>) -> CoreResult<Reservation> {
        let actor = require_manager(actor)?;

        let reservation = self.get(id)?;
        if reservation.status != ReservationStatus::Pending {
            return Err(CoreError::invalid_state(format!(
                "reservation {id} is not pending"
            )));
        }

        let mut patch = Record::new();
        patch.set("status", "confirmed");
        patch.set("approved_by", actor.username.clone());
        patch.set("approved_at", now_stamp());
        let updated = self.apply_patch(id, patch)?;

        self.audit.record(
            Some(actor),
            "reservation",
            "reservation",
            id,
            format!("Approved gear request from {}", reservation.reserved_by),
            None,
        )?;
        Ok(updated)
    }

    /// Rejects a request. Manager only.
    pub fn reject(
        &self,
        id: &str,
        reason: Option<String>,
        actor: Option<&Claims>,
    ) -> CoreResult<Reservation> {
        let actor = require_manager(actor)?;
        let reservation = self.get(id)?;

        let mut patch = Record::new();
        patch.set("status", "rejected");
        patch.set("rejected_by", actor.username.clone());
        patch.set("rejected_at", now_stamp());
        patch.set(
            "rejection_reason",
            reason.map_or(Value::Null, Value::from),
        );
        let updated = self.apply_patch(id, patch)?;

        self.audit.record(
            Some(actor),
            "reservation",
            "reservation",
            id,
            format!("Rejected gear request from {}", reservation.reserved_by),
            None,
        )?;
        Ok(updated)
    }

    /// Cancels a reservation. Requesters may cancel only their own;
    /// managers may cancel any.
    pub fn cancel(&self, id: &str, actor: Option<&Claims>) -> CoreResult<Reservation> {
        let actor = require_actor(actor)?;
        let reservation = self.get(id)?;

        if !actor.role.is_manager()
            && reservation.reserved_by.to_lowercase() != actor.username.to_lowercase()
        {
            return Err(CoreError::forbidden(
                "only your own reservations can be cancelled",
            ));
        }

        let mut patch = Record::new();
        patch.set("status", "cancelled");
        patch.set("cancelled_by", actor.username.clone());
        patch.set("cancelled_at", now_stamp());
        let updated = self.apply_patch(id, patch)?;

        self.audit.record(
            Some(actor),
            "reservation",
            "reservation",
            id,
            format!("Cancelled reservation for {}", reservation.reserved_by),
            None,
        )?;
        Ok(updated)
    }

    /// Applies a patch to a reservation record and returns the typed
    /// result.
    fn apply_patch(&self, id: &str, patch: Record) -> CoreResult<Reservation> {
        let updated = self
            .store
            .update(collections::RESERVATIONS, "id", &Value::from(id), patch)?
            .ok_or_else(|| CoreError::not_found("reservation", id))?;
        from_record(collections::RESERVATIONS, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearbase_auth::Role;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        manager: ReservationManager,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = tempdir().unwrap();
        let store = Arc::new(CollectionStore::open(temp.path()).unwrap());
        let audit = AuditTrail::new(Arc::clone(&store));

        // Seed one asset for reservations to reference.
        let mut asset = Record::new();
        asset.set("asset_id", "CAM001");
        asset.set("asset_name", "Sony A7");
        asset.set("status", "available");
        store.insert(collections::ASSETS, asset).unwrap();

        Fixture {
            manager: ReservationManager::new(store, audit),
            _temp: temp,
        }
    }

    fn manager_claims() -> Claims {
        Claims {
            user_id: 1,
            username: "boss".to_string(),
            role: Role::EquipmentManager,
            exp: u64::MAX,
        }
    }

    fn member_claims(username: &str) -> Claims {
        Claims {
            user_id: 2,
            username: username.to_string(),
            role: Role::TeamMember,
            exp: u64::MAX,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january(f: &Fixture, start: u32, end: u32, actor: &Claims) -> CoreResult<Reservation> {
        f.manager.request(
            NewReservation {
                asset_id: "CAM001".to_string(),
                reserved_by: None,
                start_date: date(2024, 1, start),
                end_date: date(2024, 1, end),
                purpose: String::new(),
            },
            Some(actor),
        )
    }

    #[test]
    fn inclusive_boundary_conflicts() {
        let f = fixture();
        january(&f, 10, 15, &manager_claims()).unwrap();

        // Ending the day another begins is a conflict.
        let touching = january(&f, 15, 20, &manager_claims());
        assert!(matches!(touching, Err(CoreError::Conflict { .. })));

        // The day after is free.
        assert!(january(&f, 16, 20, &manager_claims()).is_ok());
    }

    #[test]
    fn conflict_failure_persists_nothing() {
        let f = fixture();
        january(&f, 10, 15, &manager_claims()).unwrap();
        let _ = january(&f, 12, 14, &manager_claims());

        assert_eq!(f.manager.all().unwrap().len(), 1);
    }

    #[test]
    fn inactive_reservations_do_not_block() {
        let f = fixture();
        let member = member_claims("carol");
        let first = january(&f, 10, 15, &member).unwrap();
        f.manager.cancel(&first.id, Some(&member)).unwrap();

        assert!(january(&f, 10, 15, &manager_claims()).is_ok());
    }

    #[test]
    fn has_conflict_can_exclude_a_reservation() {
        let f = fixture();
        let existing = january(&f, 10, 15, &manager_claims()).unwrap();

        assert!(f
            .manager
            .has_conflict("CAM001", date(2024, 1, 12), date(2024, 1, 13), None)
            .unwrap());
        assert!(!f
            .manager
            .has_conflict(
                "CAM001",
                date(2024, 1, 12),
                date(2024, 1, 13),
                Some(existing.id.as_str())
            )
            .unwrap());
    }

    #[test]
    fn other_assets_never_conflict() {
        let f = fixture();
        january(&f, 10, 15, &manager_claims()).unwrap();

        assert!(!f
            .manager
            .has_conflict("LEN001", date(2024, 1, 10), date(2024, 1, 15), None)
            .unwrap());
    }

    #[test]
    fn role_decides_initial_status() {
        let f = fixture();

        let confirmed = january(&f, 1, 2, &manager_claims()).unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let pending = january(&f, 5, 6, &member_claims("carol")).unwrap();
        assert_eq!(pending.status, ReservationStatus::Pending);
        assert_eq!(pending.reserved_by, "carol");
    }

    #[test]
    fn end_before_start_is_invalid() {
        let f = fixture();
        let result = january(&f, 15, 10, &manager_claims());
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let f = fixture();
        let result = f.manager.request(
            NewReservation {
                asset_id: "LEN001".to_string(),
                reserved_by: None,
                start_date: date(2024, 1, 1),
                end_date: date(2024, 1, 2),
                purpose: String::new(),
            },
            Some(&manager_claims()),
        );
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn approve_is_manager_only_and_needs_pending() {
        let f = fixture();
        let member = member_claims("carol");
        let pending = january(&f, 1, 3, &member).unwrap();

        let by_member = f.manager.approve(&pending.id, Some(&member));
        assert!(matches!(by_member, Err(CoreError::Forbidden { .. })));

        let approved = f.manager.approve(&pending.id, Some(&manager_claims())).unwrap();
        assert_eq!(approved.status, ReservationStatus::Confirmed);
        assert_eq!(approved.approved_by.as_deref(), Some("boss"));
        assert!(approved.approved_at.is_some());

        // Already confirmed, no longer pending.
        let again = f.manager.approve(&pending.id, Some(&manager_claims()));
        assert!(matches!(again, Err(CoreError::InvalidState { .. })));
    }

    #[test]
    fn reject_records_reason() {
        let f = fixture();
        let pending = january(&f, 1, 3, &member_claims("carol")).unwrap();

        let rejected = f
            .manager
            .reject(
                &pending.id,
                Some("camera needed elsewhere".to_string()),
                Some(&manager_claims()),
            )
            .unwrap();
        assert_eq!(rejected.status, ReservationStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("camera needed elsewhere")
        );
    }

    #[test]
    fn cancel_honors_ownership() {
        let f = fixture();
        let carol = member_claims("carol");
        let dave = member_claims("dave");
        let reservation = january(&f, 1, 3, &carol).unwrap();

        let by_other = f.manager.cancel(&reservation.id, Some(&dave));
        assert!(matches!(by_other, Err(CoreError::Forbidden { .. })));

        // Ownership check is case-insensitive.
        let carol_caps = member_claims("Carol");
        let cancelled = f.manager.cancel(&reservation.id, Some(&carol_caps)).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn managers_cancel_anyone() {
        let f = fixture();
        let reservation = january(&f, 1, 3, &member_claims("carol")).unwrap();

        let cancelled = f
            .manager
            .cancel(&reservation.id, Some(&manager_claims()))
            .unwrap();
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("boss"));
    }

    #[test]
    fn visibility_is_role_scoped() {
        let f = fixture();
        january(&f, 1, 2, &member_claims("carol")).unwrap();
        january(&f, 5, 6, &member_claims("dave")).unwrap();

        assert_eq!(f.manager.visible_to(&manager_claims()).unwrap().len(), 2);
        let carols = f.manager.visible_to(&member_claims("carol")).unwrap();
        assert_eq!(carols.len(), 1);
        assert_eq!(carols[0].reserved_by, "carol");
    }
}
