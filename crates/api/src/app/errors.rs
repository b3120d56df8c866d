//! Consistent envelope responses.
//!
//! Every handler answers with an [`ApiResponse`]: the normalized
//! [`ActionResult`] as the JSON body and an HTTP status derived from its code.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use sitegate_core::{ActionResult, DomainError, ErrorCode, Failure, normalize, normalize_result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    result: ActionResult<T>,
    ok_status: StatusCode,
}

impl<T> ApiResponse<T> {
    pub fn new(result: ActionResult<T>) -> Self {
        Self {
            result,
            ok_status: StatusCode::OK,
        }
    }

    /// Answer `201 Created` on success.
    pub fn created(mut self) -> Self {
        self.ok_status = StatusCode::CREATED;
        self
    }

    pub fn result(&self) -> &ActionResult<T> {
        &self.result
    }

    pub fn status(&self) -> StatusCode {
        match &self.result {
            ActionResult::Ok { .. } => self.ok_status,
            ActionResult::Fail { code, .. } => status_for(*code),
        }
    }
}

impl<T> From<Result<T, Failure>> for ApiResponse<T> {
    fn from(value: Result<T, Failure>) -> Self {
        Self::new(normalize_result(value))
    }
}

impl<T> From<Failure> for ApiResponse<T> {
    fn from(value: Failure) -> Self {
        Self::new(normalize(value))
    }
}

impl<T> From<DomainError> for ApiResponse<T> {
    fn from(value: DomainError) -> Self {
        Self::from(Failure::from(value))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.result)).into_response()
    }
}

/// HTTP status for a failure code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Panics inside a handler become the same opaque `INTERNAL` envelope as any
/// other unexpected fault.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    let failure = Failure::internal(anyhow::anyhow!("handler panicked: {detail}"));
    ApiResponse::<()>::from(failure).into_response()
}
