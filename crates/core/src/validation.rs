//! Validation boundary signal.
//!
//! Schema-level validation lives with the request types; all this module
//! fixes is the shape of its failure: field name → ordered messages.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name → violation messages, in the order they were reported.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Per-field violations collected while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationErrors(FieldErrors);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation; messages for the same field keep their order.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.0
    }

    pub fn into_field_errors(self) -> FieldErrors {
        self.0
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Add `message` under `field` when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    /// Add `message` under `field` when `value` is longer than `max` chars.
    pub fn max_chars(&mut self, field: &str, value: &str, max: usize, message: &str) {
        if value.chars().count() > max {
            self.add(field, message);
        }
    }

    /// Add `message` under `field` unless `value` looks like an email address.
    pub fn email(&mut self, field: &str, value: &str, message: &str) {
        if !is_plausible_email(value) {
            self.add(field, message);
        }
    }
}

impl From<FieldErrors> for ValidationErrors {
    fn from(value: FieldErrors) -> Self {
        Self(value)
    }
}

/// Implemented by inputs that cross the validation boundary.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Structural check only: one `@`, non-empty local part, dotted domain, no
/// whitespace.
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_report_order_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is required");
        errors.add("name", "is too long");
        errors.add("email", "must be an email address");

        assert_eq!(
            errors.field("email").unwrap(),
            ["is required", "must be an email address"]
        );
        assert_eq!(errors.field("name").unwrap(), ["is too long"]);
        assert!(errors.field("message").is_none());
    }

    #[test]
    fn finish_is_ok_only_when_empty() {
        assert!(ValidationErrors::new().finish().is_ok());

        let mut errors = ValidationErrors::new();
        errors.require("title", "   ", "is required");
        assert!(errors.finish().is_err());
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let mut errors = ValidationErrors::new();
        errors.max_chars("name", "ééé", 3, "too long");
        assert!(errors.is_empty());
        errors.max_chars("name", "éééé", 3, "too long");
        assert!(!errors.is_empty());
    }

    #[test]
    fn plausible_email_shapes() {
        assert!(is_plausible_email("user@example.com"));
        assert!(is_plausible_email("  first.last+tag@mail.example.org "));
        assert!(!is_plausible_email("invalid-email"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@localhost"));
        assert!(!is_plausible_email("user@exa mple.com"));
        assert!(!is_plausible_email("a@b@example.com"));
        assert!(!is_plausible_email("user@.example"));
    }
}
