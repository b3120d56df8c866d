//! Request/response DTOs and the JSON body extractor.

use std::convert::Infallible;

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use sitegate_auth::Role;
use sitegate_core::{DomainError, Failure, UserId, Validate, ValidationErrors};

/// JSON body whose parse outcome is kept rather than rejected.
///
/// Axum runs extractors before the handler body, so a plain `Json<T>` would
/// answer malformed input before authorization ran. Handlers authorize first
/// and only then look at the body via [`JsonBody::validated`].
pub struct JsonBody<T>(Result<T, Failure>);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let parsed = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(value),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "malformed request body");
                Err(DomainError::bad_request("Malformed request body").into())
            }
        };
        Ok(Self(parsed))
    }
}

impl<T> JsonBody<T> {
    pub fn from_value(value: T) -> Self {
        Self(Ok(value))
    }

    /// The parsed body; `BAD_REQUEST` if it did not parse.
    pub fn into_inner(self) -> Result<T, Failure> {
        self.0
    }
}

impl<T: Validate> JsonBody<T> {
    /// The parsed body after it passed validation.
    pub fn validated(self) -> Result<T, Failure> {
        let value = self.0?;
        value.validate()?;
        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title is required");
        errors.max_chars("title", &self.title, 200, "Title must be at most 200 characters");
        errors.require("body", &self.body, "Body is required");
        errors.max_chars("body", &self.body, 20_000, "Body must be at most 20000 characters");
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author: UserId,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Media
// ─────────────────────────────────────────────────────────────────────────────

pub const MAX_MEDIA_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "application/pdf",
];

#[derive(Debug, Clone, Deserialize)]
pub struct UploadMediaRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl Validate for UploadMediaRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("file_name", &self.file_name, "File name is required");
        errors.max_chars(
            "file_name",
            &self.file_name,
            255,
            "File name must be at most 255 characters",
        );
        if self.file_name.contains(['/', '\\']) {
            errors.add("file_name", "File name must not contain path separators");
        }
        if !ALLOWED_MEDIA_TYPES.contains(&self.content_type.as_str()) {
            errors.add("content_type", "Unsupported media type");
        }
        if self.size_bytes == 0 || self.size_bytes > MAX_MEDIA_BYTES {
            errors.add("size_bytes", "File must be between 1 byte and 10 MiB");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaView {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("email", &self.email, "Email is required");
        errors.email("email", &self.email, "Email must be a valid email address");
        errors.require("display_name", &self.display_name, "Display name is required");
        errors.max_chars(
            "display_name",
            &self.display_name,
            100,
            "Display name must be at most 100 characters",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Email / contact
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Validate for SendEmailRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.email("to", &self.to, "Recipient must be a valid email address");
        errors.require("subject", &self.subject, "Subject is required");
        errors.max_chars("subject", &self.subject, 200, "Subject must be at most 200 characters");
        errors.require("body", &self.body, "Body is required");
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Validate for ContactRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required");
        errors.max_chars("name", &self.name, 100, "Name must be at most 100 characters");
        errors.require("email", &self.email, "Email is required");
        errors.email("email", &self.email, "Email must be a valid email address");
        errors.require("message", &self.message, "Message is required");
        errors.max_chars(
            "message",
            &self.message,
            5_000,
            "Message must be at most 5000 characters",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectQuery {
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainQuery {
    pub permission: String,
    pub role: Option<Role>,
}
