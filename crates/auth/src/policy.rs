//! Role → permission mapping.

use std::collections::{HashMap, HashSet};

use crate::permissions::{account, admin, contact, content, email, media, users};
use crate::{Permission, Role};

/// Immutable role → permission grants.
///
/// Built once at startup and shared (typically behind an `Arc`) with the
/// [`AuthorizationGate`](crate::AuthorizationGate). There is no way to mutate
/// a model after [`PermissionModelBuilder::build`]; a different policy means
/// building a different model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionModel {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionModel {
    pub fn builder() -> PermissionModelBuilder {
        PermissionModelBuilder::default()
    }

    /// The grants the application ships with.
    ///
    /// Admin's permissions are a superset of user's, spelled out in full.
    pub fn standard() -> Self {
        let user = [content::READ, contact::SUBMIT, account::READ];

        Self::builder()
            .grant(Role::User, user.clone())
            .grant(Role::Admin, user)
            .grant(
                Role::Admin,
                [
                    content::WRITE,
                    content::PUBLISH,
                    media::UPLOAD,
                    media::DELETE,
                    users::READ,
                    users::MANAGE,
                    email::SEND,
                    contact::READ,
                    admin::ACCESS,
                ],
            )
            .build()
    }

    /// Whether `role` holds `permission`.
    ///
    /// Total: a role the model has no entry for holds nothing.
    pub fn has_permission(&self, role: Role, permission: &Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|granted| granted.contains(permission))
    }

    /// Everything `role` holds, sorted.
    pub fn permissions_for(&self, role: Role) -> Vec<&Permission> {
        let mut perms: Vec<&Permission> = self
            .grants
            .get(&role)
            .map(|granted| granted.iter().collect())
            .unwrap_or_default();
        perms.sort();
        perms
    }

    /// Roles that hold `permission`.
    pub fn roles_with(&self, permission: &Permission) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has_permission(*role, permission))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct PermissionModelBuilder {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionModelBuilder {
    /// Add grants to `role`; repeated calls accumulate.
    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    pub fn build(self) -> PermissionModel {
        PermissionModel {
            grants: self.grants,
        }
    }
}
