use axum::{Router, routing::get};
use uuid::Uuid;

use sitegate_core::{DomainError, Failure};

pub mod admin;
pub mod auth;
pub mod contact;
pub mod content;
pub mod email;
pub mod media;
pub mod system;
pub mod users;

/// Router for every endpoint. Public and privileged routes share it; the
/// gate is applied per handler.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/content", content::router())
        .nest("/media", media::router())
        .nest("/users", users::router())
        .nest("/email", email::router())
        .nest("/contact", contact::router())
        .nest("/admin", admin::router())
}

/// Path ids are parsed inside handlers so a bad id answers with the
/// envelope, and only after authorization.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, Failure> {
    raw.trim()
        .parse()
        .map_err(|_| DomainError::bad_request(format!("Invalid {what} id")).into())
}
