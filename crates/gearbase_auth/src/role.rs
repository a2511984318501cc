//! Staff roles carried in token claims.

use serde::{Deserialize, Serialize};

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including destructive operations.
    Admin,
    /// May approve, reject, and manage equipment.
    EquipmentManager,
    /// May borrow equipment and manage only their own requests.
    TeamMember,
}

impl Role {
    /// Returns true for the elevated roles that may approve or reject
    /// any reservation.
    #[must_use]
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Admin | Role::EquipmentManager)
    }

    /// Returns the wire name for this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::EquipmentManager => "equipment_manager",
            Role::TeamMember => "team_member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_roles() {
        assert!(Role::Admin.is_manager());
        assert!(Role::EquipmentManager.is_manager());
        assert!(!Role::TeamMember.is_manager());
    }

    #[test]
    fn wire_names() {
        let json = serde_json::to_string(&Role::EquipmentManager).unwrap();
        assert_eq!(json, "\"equipment_manager\"");

        let back: Role = serde_json::from_str("\"team_member\"").unwrap();
        assert_eq!(back, Role::TeamMember);
    }
}
