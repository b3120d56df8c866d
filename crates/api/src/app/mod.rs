//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: collaborators and in-memory state
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and the JSON body extractor
//! - `errors.rs`: envelope responses and status mapping

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use sitegate_auth::{AuthorizationGate, Hs256SessionVerifier, PermissionModel, RedirectPolicy};

use crate::config::ApiConfig;
use crate::limiter::{RateLimiter, UnlimitedRateLimiter};
use crate::mailer::{LogMailer, Mailer};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// External collaborators the router is built around.
pub struct AppDeps {
    pub model: Arc<PermissionModel>,
    pub mailer: Arc<dyn Mailer>,
    pub limiter: Arc<dyn RateLimiter>,
}

impl AppDeps {
    /// Standard permissions, log-only mail and no rate limiting.
    pub fn standard() -> Self {
        tracing::warn!("no rate limiter configured; contact submissions are unlimited");
        Self {
            model: Arc::new(PermissionModel::standard()),
            mailer: Arc::new(LogMailer),
            limiter: Arc::new(UnlimitedRateLimiter),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> Router {
    build_app_with(config, AppDeps::standard())
}

pub fn build_app_with(config: &ApiConfig, deps: AppDeps) -> Router {
    let session_state = middleware::SessionState {
        verifier: Arc::new(Hs256SessionVerifier::new(config.session_secret.as_bytes())),
    };

    let services = Arc::new(services::AppServices {
        gate: AuthorizationGate::new(Arc::clone(&deps.model)),
        redirects: RedirectPolicy::standard(Arc::clone(&deps.model)),
        mailer: deps.mailer,
        limiter: deps.limiter,
        content: services::InMemoryStore::new(),
        media: services::InMemoryStore::new(),
        users: services::UserDirectory::new(),
        inbox: services::InMemoryStore::new(),
        rate_limit_namespace: config.rate_limit_namespace.clone(),
        contact_inbox: config.contact_inbox.clone(),
    });

    routes::router()
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(errors::handle_panic)),
        )
}
