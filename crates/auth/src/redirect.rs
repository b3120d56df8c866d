//! Post-authentication redirect resolution.
//!
//! A requested destination is honored only when it is a same-origin relative
//! path that the role may reach. Everything else, including every absolute or
//! protocol-relative URL, resolves to the role's home.

use std::borrow::Cow;
use std::sync::Arc;

use crate::permissions::{account, admin};
use crate::{Permission, PermissionModel, Role};

/// A path prefix that requires a permission to enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedArea {
    prefix: Cow<'static, str>,
    permission: Permission,
}

impl ProtectedArea {
    pub fn new(prefix: impl Into<Cow<'static, str>>, permission: Permission) -> Self {
        Self {
            prefix: prefix.into(),
            permission,
        }
    }

    /// Segment-aware, case-insensitive: `/admin` covers `/admin`, `/Admin/x`
    /// `/admin;x` and `/admin?tab=1`, but not `/administrators`.
    fn covers(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        let Some(head) = path.get(..prefix.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            return false;
        }
        matches!(path[prefix.len()..].chars().next(), None | Some('/' | ';' | '?' | '#'))
    }
}

#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    user_home: Cow<'static, str>,
    admin_home: Cow<'static, str>,
    areas: Vec<ProtectedArea>,
    model: Arc<PermissionModel>,
}

impl RedirectPolicy {
    pub fn new(
        model: Arc<PermissionModel>,
        user_home: impl Into<Cow<'static, str>>,
        admin_home: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            user_home: user_home.into(),
            admin_home: admin_home.into(),
            areas: Vec::new(),
            model,
        }
    }

    /// Homes `/account` and `/admin`, each area guarded by its entry
    /// permission.
    pub fn standard(model: Arc<PermissionModel>) -> Self {
        Self::new(model, "/account", "/admin")
            .protect(ProtectedArea::new("/admin", admin::ACCESS))
            .protect(ProtectedArea::new("/account", account::READ))
    }

    pub fn protect(mut self, area: ProtectedArea) -> Self {
        self.areas.push(area);
        self
    }

    pub fn home(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user_home,
            Role::Admin => &self.admin_home,
        }
    }

    /// Where to send `role` after authentication.
    ///
    /// Returns `requested` unchanged when it is safe, otherwise the role's
    /// home. Pure; the caller performs the redirect.
    pub fn resolve(&self, requested: Option<&str>, role: Role) -> String {
        let reachable = requested
            .and_then(|raw| same_origin_path(raw).map(|path| (raw, path)))
            .filter(|(_, path)| self.may_reach(role, path));
        match reachable {
            Some((raw, _)) => raw.to_string(),
            None => self.home(role).to_string(),
        }
    }

    fn may_reach(&self, role: Role, path: &str) -> bool {
        self.areas
            .iter()
            .filter(|area| area.covers(path))
            .all(|area| self.model.has_permission(role, &area.permission))
    }
}

/// [`RedirectPolicy::resolve`] over the standard permission model and homes.
pub fn resolve_redirect(requested: Option<&str>, role: Role) -> String {
    RedirectPolicy::standard(Arc::new(PermissionModel::standard())).resolve(requested, role)
}

/// The percent-decoded path of `value` when it is a relative path on this
/// origin: a single leading `/`, no scheme or authority, no backslash, no
/// control or whitespace characters (raw or encoded), no encoded `/` or `\`,
/// and no dot segments that could climb into another area once resolved.
fn same_origin_path(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    if bytes.first() != Some(&b'/') || matches!(bytes.get(1), Some(b'/' | b'\\')) {
        return None;
    }
    if value.chars().any(|c| c == '\\' || c.is_control() || c.is_whitespace()) {
        return None;
    }

    let raw_path = value.split(['?', '#']).next().unwrap_or_default();
    let path = percent_decode_path(raw_path)?;
    if path.chars().any(|c| c == '\\' || c.is_control() || c.is_whitespace()) {
        return None;
    }
    if path.split(['/', ';']).any(|segment| segment == "." || segment == "..") {
        return None;
    }
    Some(path)
}

/// `None` for malformed escapes, non-UTF-8 output, or an escaped separator.
fn percent_decode_path(raw: &str) -> Option<String> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hi = hex_value(bytes.next()?)?;
        let lo = hex_value(bytes.next()?)?;
        let decoded = (hi << 4) | lo;
        if matches!(decoded, b'/' | b'\\') {
            return None;
        }
        out.push(decoded);
    }
    String::from_utf8(out).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
