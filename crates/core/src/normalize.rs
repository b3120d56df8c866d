//! Failure → envelope normalization.
//!
//! This is the information-disclosure boundary: whatever an operation fails
//! with, the client only ever sees a [`DomainError`]'s own code and message,
//! validation messages, or the constant internal message.
//!
//! [`DomainError`]: crate::DomainError

use crate::error::{ErrorCode, Failure};
use crate::result::ActionResult;

pub const VALIDATION_MESSAGE: &str = "Validation failed";
pub const INTERNAL_MESSAGE: &str = "Something went wrong";

/// Convert a failure into a `Fail` envelope.
///
/// - validation → `VALIDATION_ERROR` with the per-field messages
/// - domain → its code, message and field errors unchanged
/// - internal → `INTERNAL` with a constant message; the detail is logged
pub fn normalize<T>(failure: Failure) -> ActionResult<T> {
    match failure {
        Failure::Validation(errors) => ActionResult::fail(
            ErrorCode::ValidationError,
            VALIDATION_MESSAGE,
            Some(errors.into_field_errors()),
        ),
        Failure::Domain(err) => {
            let (code, message, field_errors) = err.into_parts();
            ActionResult::fail(code, message, field_errors)
        }
        Failure::Internal(err) => {
            let detail = format!("{err:#}");
            tracing::error!(error = %detail, "internal failure");
            ActionResult::fail(ErrorCode::Internal, INTERNAL_MESSAGE, None)
        }
    }
}

pub fn normalize_result<T>(result: Result<T, Failure>) -> ActionResult<T> {
    match result {
        Ok(value) => ActionResult::ok(value),
        Err(failure) => normalize(failure),
    }
}

/// Run an operation and normalize whatever it returns.
pub fn run<T>(op: impl FnOnce() -> Result<T, Failure>) -> ActionResult<T> {
    normalize_result(op())
}
