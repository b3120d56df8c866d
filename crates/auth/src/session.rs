//! Per-request session and the verifier seam that produces it.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Serialize;
use thiserror::Error;

use sitegate_core::UserId;

use crate::Role;
use crate::claims::{ClaimsError, SessionClaims, validate_claims};

/// Authenticated context for one request.
///
/// Created from a verified credential, never persisted, dropped with the
/// request. The role cannot change for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    user_id: UserId,
    role: Role,
    email: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role,
            email: None,
            expires_at,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
            expires_at: claims.expires_at,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session signature")]
    InvalidSignature,

    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] ClaimsError),
}

/// Turns a presented credential into a trusted session.
///
/// The identity provider behind this is external; implementations only
/// adapt its token format.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, SessionError>;
}

/// HS256 JWT verifier for [`SessionClaims`] tokens.
pub struct Hs256SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256SessionVerifier {
    pub fn new(secret: &[u8]) -> Self {
        // `exp` must be present, but the time window is judged against the
        // caller's `now` by `validate_claims`, not the system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionVerifier for Hs256SessionVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => SessionError::InvalidSignature,
                _ => SessionError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims.into())
    }
}
