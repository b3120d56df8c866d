use std::sync::Arc;

use serde::Serialize;

use sitegate_core::DomainError;

use crate::{Permission, PermissionModel, Role, Session};

/// The single choke point for privileged operations.
///
/// Every operation with side effects calls [`assert_permission`] before
/// doing anything. Denial is always the same `FORBIDDEN` domain failure, no
/// matter which operation or permission was involved.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// [`assert_permission`]: AuthorizationGate::assert_permission
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    model: Arc<PermissionModel>,
}

impl AuthorizationGate {
    pub fn new(model: Arc<PermissionModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &PermissionModel {
        &self.model
    }

    pub fn has_permission(&self, role: Role, permission: &Permission) -> bool {
        self.model.has_permission(role, permission)
    }

    pub fn assert_permission(
        &self,
        session: &Session,
        permission: &Permission,
    ) -> Result<(), DomainError> {
        if self.model.has_permission(session.role(), permission) {
            return Ok(());
        }

        tracing::debug!(
            user_id = %session.user_id(),
            role = %session.role(),
            permission = %permission,
            "authorization denied"
        );
        Err(DomainError::authorization_denied())
    }

    /// Explain the decision [`assert_permission`](Self::assert_permission)
    /// would make for `role`.
    pub fn explain(&self, role: Role, permission: &Permission) -> AuthorizationExplanation {
        let granted = self.model.has_permission(role, permission);
        let effective_permissions: Vec<String> = self
            .model
            .permissions_for(role)
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect();

        let reason = if granted {
            format!("Role '{role}' is granted '{permission}'")
        } else {
            format!("Role '{role}' is not granted '{permission}'")
        };

        AuthorizationExplanation {
            required_permission: permission.as_str().to_string(),
            role,
            granted,
            reason,
            effective_permissions,
            granting_roles: self.model.roles_with(permission),
        }
    }
}

/// Detailed, auditable account of one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub role: Role,
    pub granted: bool,
    pub reason: String,

    /// Everything the role holds, sorted.
    pub effective_permissions: Vec<String>,

    /// Roles that would be granted the permission.
    pub granting_roles: Vec<Role>,
}
