use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use sitegate_auth::Session;
use sitegate_core::DomainError;

/// Session context for a request.
///
/// Inserted by [`session_middleware`](crate::middleware::session_middleware)
/// on every request; empty when no valid credential was presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSession(Option<Session>);

impl RequestSession {
    pub fn new(session: Option<Session>) -> Self {
        Self(session)
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    /// The session, or `UNAUTHORIZED` when there is none.
    pub fn require(&self) -> Result<&Session, DomainError> {
        self.0
            .as_ref()
            .ok_or_else(|| DomainError::unauthorized("Authentication required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestSession>()
            .cloned()
            .unwrap_or_default())
    }
}
