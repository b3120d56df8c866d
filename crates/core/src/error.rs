//! Error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{FieldErrors, ValidationErrors};

/// Message carried by every authorization denial.
pub const FORBIDDEN_MESSAGE: &str = "You are not authorized to perform this action";

/// Stable, client-facing error code.
///
/// The set is closed. A new code means a new variant here, and every
/// transport mapping has to handle it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed schema validation; per-field messages are attached.
    ValidationError,

    /// The request could not be understood (e.g. malformed body).
    BadRequest,

    /// No trusted session accompanies a request that needs one.
    Unauthorized,

    /// The session's role lacks the required permission.
    Forbidden,

    /// A requested resource does not exist.
    NotFound,

    /// The request conflicts with current state.
    Conflict,

    /// The caller exceeded an abuse-prevention limit.
    RateLimited,

    /// Anything unexpected. The message is constant and detail-free.
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codes business logic may raise directly through [`DomainError::new`].
///
/// There is no `Forbidden` here: denial is only produced by
/// [`DomainError::authorization_denied`], which the authorization gate calls.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DomainCode {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    RateLimited,
}

impl From<DomainCode> for ErrorCode {
    fn from(value: DomainCode) -> Self {
        match value {
            DomainCode::BadRequest => ErrorCode::BadRequest,
            DomainCode::Unauthorized => ErrorCode::Unauthorized,
            DomainCode::NotFound => ErrorCode::NotFound,
            DomainCode::Conflict => ErrorCode::Conflict,
            DomainCode::RateLimited => ErrorCode::RateLimited,
        }
    }
}

/// A typed, intentionally raised failure with a stable code and a
/// user-facing message.
///
/// Unlike [`Failure::Internal`], everything in here is safe to show a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    field_errors: Option<FieldErrors>,
}

impl DomainError {
    pub fn new(code: DomainCode, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field_errors: None,
        }
    }

    /// The uniform authorization denial.
    pub fn authorization_denied() -> Self {
        Self {
            code: ErrorCode::Forbidden,
            message: FORBIDDEN_MESSAGE.to_string(),
            field_errors: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(DomainCode::BadRequest, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(DomainCode::Unauthorized, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(DomainCode::NotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(DomainCode::Conflict, msg)
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(DomainCode::RateLimited, msg)
    }

    /// Attach per-field messages (e.g. a uniqueness violation on `email`).
    pub fn with_field_errors(mut self, field_errors: FieldErrors) -> Self {
        self.field_errors = Some(field_errors);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.field_errors.as_ref()
    }

    pub fn into_parts(self) -> (ErrorCode, String, Option<FieldErrors>) {
        (self.code, self.message, self.field_errors)
    }
}

/// Everything an operation can fail with, before normalization.
///
/// Classification happens on this discriminator, never on the shape of the
/// payload.
#[derive(Debug, Error)]
pub enum Failure {
    /// The validation boundary rejected the input.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Business logic raised a typed failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any unexpected fault. The payload is for logs only.
    #[error("internal failure: {0:#}")]
    Internal(anyhow::Error),
}

impl Failure {
    /// Wrap an unexpected fault.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<anyhow::Error> for Failure {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}
