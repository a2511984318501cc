//! Role guards for mutating operations.

use crate::error::{CoreError, CoreResult};
use gearbase_auth::{Claims, Role};

/// Requires any authenticated identity.
pub(crate) fn require_actor(actor: Option<&Claims>) -> CoreResult<&Claims> {
    actor.ok_or(CoreError::Unauthorized)
}

/// Requires an elevated (manager) role.
pub(crate) fn require_manager(actor: Option<&Claims>) -> CoreResult<&Claims> {
    let claims = require_actor(actor)?;
    if claims.role.is_manager() {
        Ok(claims)
    } else {
        Err(CoreError::forbidden("manager role required"))
    }
}

/// Requires the admin role.
pub(crate) fn require_admin(actor: Option<&Claims>) -> CoreResult<&Claims> {
    let claims = require_actor(actor)?;
    if claims.role == Role::Admin {
        Ok(claims)
    } else {
        Err(CoreError::forbidden("admin role required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims {
            user_id: 1,
            username: "user".to_string(),
            role,
            exp: u64::MAX,
        }
    }

    #[test]
    fn anonymous_is_unauthorized() {
        assert!(matches!(require_actor(None), Err(CoreError::Unauthorized)));
        assert!(matches!(require_manager(None), Err(CoreError::Unauthorized)));
    }

    #[test]
    fn role_ladder() {
        let member = claims(Role::TeamMember);
        let manager = claims(Role::EquipmentManager);
        let admin = claims(Role::Admin);

        assert!(require_actor(Some(&member)).is_ok());
        assert!(matches!(
            require_manager(Some(&member)),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(require_manager(Some(&manager)).is_ok());
        assert!(matches!(
            require_admin(Some(&manager)),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(require_admin(Some(&admin)).is_ok());
    }
}
