use auth_identity::{Identity, UserId};

use crate::error::GatewayError;

/// Self-or-admin access to per-user resources.
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    pub fn can_access(identity: &Identity, target_user_id: UserId) -> bool {
        identity.user_id == target_user_id || identity.role.is_admin()
    }

    pub fn authorize(identity: &Identity, target_user_id: UserId) -> Result<(), GatewayError> {
        if Self::can_access(identity, target_user_id) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = identity.user_id,
                target_user_id,
                role = %identity.role,
                "Access denied"
            );
            Err(GatewayError::AccessDenied)
        }
    }
}
