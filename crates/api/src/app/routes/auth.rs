//! Post-authentication redirect.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use sitegate_core::{DomainError, Failure};

use crate::app::{dto::RedirectQuery, errors::ApiResponse, services::AppServices};
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new().route("/redirect", get(redirect))
}

/// `303 See Other` to the resolved destination for the signed-in role.
pub async fn redirect(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    query: Result<Query<RedirectQuery>, QueryRejection>,
) -> Response {
    match resolve(&services, &session, query) {
        Ok(target) => Redirect::to(&target).into_response(),
        Err(failure) => ApiResponse::<()>::from(failure).into_response(),
    }
}

fn resolve(
    services: &AppServices,
    session: &RequestSession,
    query: Result<Query<RedirectQuery>, QueryRejection>,
) -> Result<String, Failure> {
    let session = session.require()?;
    let Query(query) = query.map_err(|_| DomainError::bad_request("Malformed query string"))?;

    let target = services.redirects.resolve(query.to.as_deref(), session.role());
    if query.to.as_deref().is_some_and(|requested| requested != target) {
        tracing::info!(
            requested = ?query.to,
            resolved = %target,
            role = %session.role(),
            "redirect target replaced with role home"
        );
    }
    Ok(target)
}
