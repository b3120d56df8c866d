use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use sitegate_auth::{Role, permissions::account};
use sitegate_core::{DomainError, UserId};

use crate::app::errors::ApiResponse;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: UserId,
    pub role: Role,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub permissions: Vec<String>,
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
) -> ApiResponse<WhoAmI> {
    authorize(&services.gate, &session, &account::READ)
        .map(|s| WhoAmI {
            user_id: s.user_id(),
            role: s.role(),
            email: s.email().map(str::to_string),
            expires_at: s.expires_at(),
            permissions: services
                .gate
                .model()
                .permissions_for(s.role())
                .into_iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        })
        .into()
}

pub async fn not_found() -> ApiResponse<()> {
    DomainError::not_found("Resource not found").into()
}
