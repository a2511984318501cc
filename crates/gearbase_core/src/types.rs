//! Closed value sets shared across the core.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// On the shelf, may be checked out or reserved.
    Available,
    /// In a borrower's hands.
    CheckedOut,
    /// Pulled from circulation for repair.
    Maintenance,
    /// Missing; out of circulation until recovered.
    Lost,
}

impl AssetStatus {
    /// Returns the wire name for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::CheckedOut => "checked_out",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported physical condition of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// As new.
    #[default]
    Excellent,
    /// Normal wear.
    Good,
    /// Usable but worn.
    Fair,
    /// Must go to maintenance before the next loan.
    NeedsRepair,
}

impl Condition {
    /// Returns the wire name for this condition.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::NeedsRepair => "needs_repair",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Asset handed to a borrower.
    Checkout,
    /// Asset returned.
    Checkin,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransactionKind::Checkout => "checkout",
            TransactionKind::Checkin => "checkin",
        })
    }
}

/// Status of a reservation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Awaiting manager approval.
    Pending,
    /// Approved; blocks the interval.
    Confirmed,
    /// Withdrawn by the requester or a manager.
    Cancelled,
    /// Declined by a manager.
    Rejected,
}

impl ReservationStatus {
    /// Returns true if this reservation no longer blocks its interval.
    #[must_use]
    pub fn is_inactive(self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Rejected)
    }
}

/// Severity of a maintenance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Cosmetic.
    Low,
    /// Degraded but usable.
    Medium,
    /// Unusable for most work; pulls the asset from circulation.
    High,
    /// Safety hazard or total failure; pulls the asset from circulation.
    Critical,
}

impl IssueSeverity {
    /// Returns true if reporting at this severity forces the asset into
    /// maintenance.
    #[must_use]
    pub fn grounds_asset(self) -> bool {
        matches!(self, IssueSeverity::High | IssueSeverity::Critical)
    }
}

/// Lifecycle status of a maintenance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Reported, not yet picked up.
    Open,
    /// Being worked on.
    InProgress,
    /// Fixed.
    Resolved,
    /// Closed without a fix (duplicate, invalid, asset retired).
    Closed,
}

impl IssueStatus {
    /// Returns true once the issue can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&AssetStatus::CheckedOut).unwrap();
        assert_eq!(json, "\"checked_out\"");

        let back: AssetStatus = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(back, AssetStatus::Maintenance);
    }

    #[test]
    fn severity_grounding() {
        assert!(!IssueSeverity::Low.grounds_asset());
        assert!(!IssueSeverity::Medium.grounds_asset());
        assert!(IssueSeverity::High.grounds_asset());
        assert!(IssueSeverity::Critical.grounds_asset());
    }

    #[test]
    fn inactive_reservation_statuses() {
        assert!(ReservationStatus::Cancelled.is_inactive());
        assert!(ReservationStatus::Rejected.is_inactive());
        assert!(!ReservationStatus::Pending.is_inactive());
        assert!(!ReservationStatus::Confirmed.is_inactive());
    }
}
