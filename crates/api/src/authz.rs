//! API-side authorization guard.
//!
//! Handlers call [`authorize`] before touching any state, so a denied caller
//! never reaches a lookup or a side effect.

use sitegate_auth::{AuthorizationGate, Permission, Session};
use sitegate_core::Failure;

use crate::context::RequestSession;

/// Require a session and check `permission` against it.
///
/// - no session → `UNAUTHORIZED`
/// - session without the permission → `FORBIDDEN`
pub fn authorize<'s>(
    gate: &AuthorizationGate,
    session: &'s RequestSession,
    permission: &Permission,
) -> Result<&'s Session, Failure> {
    let session = session.require()?;
    gate.assert_permission(session, permission)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use sitegate_auth::{PermissionModel, Role, permissions::users};
    use sitegate_core::{ErrorCode, UserId};

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(PermissionModel::standard()))
    }

    fn code_of(result: Result<&Session, Failure>) -> Option<ErrorCode> {
        match result {
            Ok(_) => None,
            Err(Failure::Domain(e)) => Some(e.code()),
            Err(other) => panic!("unexpected failure {other:?}"),
        }
    }

    #[test]
    fn anonymous_is_unauthorized() {
        let anon = RequestSession::anonymous();
        assert_eq!(
            code_of(authorize(&gate(), &anon, &users::MANAGE)),
            Some(ErrorCode::Unauthorized)
        );
    }

    #[test]
    fn wrong_role_is_forbidden_right_role_passes() {
        let expires = Utc::now() + Duration::minutes(5);
        let user = RequestSession::new(Some(Session::new(UserId::new(), Role::User, expires)));
        let admin = RequestSession::new(Some(Session::new(UserId::new(), Role::Admin, expires)));

        assert_eq!(code_of(authorize(&gate(), &user, &users::MANAGE)), Some(ErrorCode::Forbidden));
        assert_eq!(code_of(authorize(&gate(), &admin, &users::MANAGE)), None);
    }
}
