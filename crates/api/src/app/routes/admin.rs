//! Admin-only diagnostics.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query, rejection::QueryRejection},
    routing::get,
};

use sitegate_auth::{AuthorizationExplanation, Permission, permissions::admin};
use sitegate_core::{DomainError, Failure};

use crate::app::dto::ExplainQuery;
use crate::app::errors::ApiResponse;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new().route("/authz/explain", get(explain))
}

/// Explain how the gate would decide `permission` for `role` (defaults to
/// the caller's role).
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    query: Result<Query<ExplainQuery>, QueryRejection>,
) -> ApiResponse<AuthorizationExplanation> {
    let result = (|| {
        let caller = authorize(&services.gate, &session, &admin::ACCESS)?;
        let Query(query) = query.map_err(|_| DomainError::bad_request("Malformed query string"))?;

        let permission = query.permission.trim();
        if permission.is_empty() {
            return Err(Failure::from(DomainError::bad_request("permission is required")));
        }
        let role = query.role.unwrap_or(caller.role());
        Ok::<_, Failure>(services.gate.explain(role, &Permission::new(permission.to_string())))
    })();
    result.into()
}
