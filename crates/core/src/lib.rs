//! `sitegate-core` — error contract shared by every server-side operation.
//!
//! This crate contains the closed error taxonomy, the `Ok`/`Fail` result
//! envelope, the validation signal and the normalizer that turns any failure
//! into a client-safe envelope. It has no HTTP or storage concerns.

pub mod error;
pub mod id;
pub mod normalize;
pub mod result;
pub mod validation;

pub use error::{DomainCode, DomainError, ErrorCode, FORBIDDEN_MESSAGE, Failure};
pub use id::UserId;
pub use normalize::{INTERNAL_MESSAGE, VALIDATION_MESSAGE, normalize, normalize_result, run};
pub use result::{ActionResult, FailBody};
pub use validation::{FieldErrors, Validate, ValidationErrors};
