use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "content.publish"). They are not
/// hierarchical and there is no wildcard: every grant is listed explicitly
/// in the permission model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub mod content {
    use super::Permission;

    pub const READ: Permission = Permission::from_static("content.read");
    pub const WRITE: Permission = Permission::from_static("content.write");
    pub const PUBLISH: Permission = Permission::from_static("content.publish");
}

pub mod media {
    use super::Permission;

    pub const UPLOAD: Permission = Permission::from_static("media.upload");
    pub const DELETE: Permission = Permission::from_static("media.delete");
}

pub mod users {
    use super::Permission;

    pub const READ: Permission = Permission::from_static("users.read");
    pub const MANAGE: Permission = Permission::from_static("users.manage");
}

pub mod email {
    use super::Permission;

    pub const SEND: Permission = Permission::from_static("email.send");
}

pub mod contact {
    use super::Permission;

    pub const SUBMIT: Permission = Permission::from_static("contact.submit");
    pub const READ: Permission = Permission::from_static("contact.read");
}

pub mod account {
    use super::Permission;

    pub const READ: Permission = Permission::from_static("account.read");
}

pub mod admin {
    use super::Permission;

    /// Entry to the admin area (dashboard, authorization audit).
    pub const ACCESS: Permission = Permission::from_static("admin.access");
}
