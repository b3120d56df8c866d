//! Success/failure envelope returned by every server-side operation.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::validation::FieldErrors;

/// Tagged `Ok`/`Fail` union.
///
/// Serialized with a `status` discriminator:
///
/// ```json
/// {"status":"ok","value":{"id":"..."}}
/// {"status":"fail","code":"FORBIDDEN","message":"..."}
/// ```
///
/// `fieldErrors` is omitted when there are none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult<T> {
    Ok {
        value: T,
    },
    Fail {
        code: ErrorCode,
        message: String,
        #[serde(
            rename = "fieldErrors",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        field_errors: Option<FieldErrors>,
    },
}

/// The failure half of an [`ActionResult`], detached from the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(rename = "fieldErrors", default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl<T> ActionResult<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok { value }
    }

    pub fn fail(
        code: ErrorCode,
        message: impl Into<String>,
        field_errors: Option<FieldErrors>,
    ) -> Self {
        Self::Fail {
            code,
            message: message.into(),
            field_errors,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// `None` for `Ok`.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ok { .. } => None,
            Self::Fail { code, .. } => Some(*code),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            Self::Ok { value } => ActionResult::Ok { value: f(value) },
            Self::Fail {
                code,
                message,
                field_errors,
            } => ActionResult::Fail {
                code,
                message,
                field_errors,
            },
        }
    }

    pub fn into_result(self) -> Result<T, FailBody> {
        match self {
            Self::Ok { value } => Ok(value),
            Self::Fail {
                code,
                message,
                field_errors,
            } => Err(FailBody {
                code,
                message,
                field_errors,
            }),
        }
    }
}

impl<T> From<FailBody> for ActionResult<T> {
    fn from(value: FailBody) -> Self {
        Self::Fail {
            code: value.code,
            message: value.message,
            field_errors: value.field_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_serializes_value_only() {
        let res = ActionResult::ok(json!({ "id": 7 }));
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value, json!({ "status": "ok", "value": { "id": 7 } }));
    }

    #[test]
    fn forbidden_round_trip_preserves_absence_of_field_errors() {
        let res: ActionResult<()> = ActionResult::fail(ErrorCode::Forbidden, "msg", None);

        let text = serde_json::to_string(&res).unwrap();
        assert!(!text.contains("fieldErrors"));
        assert!(!text.contains("value"));

        let back: ActionResult<()> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, res);
        let body = back.into_result().unwrap_err();
        assert_eq!(body.code, ErrorCode::Forbidden);
        assert_eq!(body.message, "msg");
        assert!(body.field_errors.is_none());
    }

    #[test]
    fn field_errors_round_trip_in_order() {
        let mut fields = FieldErrors::new();
        fields.insert(
            "email".to_string(),
            vec!["is required".to_string(), "must be an email".to_string()],
        );
        let res: ActionResult<()> = ActionResult::fail(
            ErrorCode::ValidationError,
            "Validation failed",
            Some(fields.clone()),
        );

        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["fieldErrors"]["email"][1], "must be an email");

        let back: ActionResult<()> = serde_json::from_value(value).unwrap();
        assert_eq!(back.into_result().unwrap_err().field_errors, Some(fields));
    }

    #[test]
    fn envelope_without_status_is_rejected() {
        let parsed: Result<ActionResult<u32>, _> =
            serde_json::from_value(json!({ "value": 1 }));
        assert!(parsed.is_err());
    }

    #[test]
    fn map_keeps_failures_untouched() {
        let res: ActionResult<u32> = ActionResult::fail(ErrorCode::NotFound, "gone", None);
        let mapped = res.map(|v| v * 2);
        assert_eq!(mapped.code(), Some(ErrorCode::NotFound));

        let ok = ActionResult::ok(21).map(|v| v * 2);
        assert_eq!(ok.into_result().unwrap(), 42);
    }
}
