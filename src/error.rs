//! Error codes and the JSON error envelope shared by server and client

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-readable error kinds carried in the `error` field of every failure body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingParameters,
    InvalidParameterType,
    NegativeInitialSavings,
    NegativeMonthlyDeposit,
    NegativeInterestRate,
    InvalidYears,
    ExcessiveInitialSavings,
    ExcessiveMonthlyDeposit,
    ExcessiveInterestRate,
    ExcessiveYears,
    InvalidRequestBody,
    NotFound,
    MethodNotAllowed,
    TooManyRequests,
    ServerError,
    /// Any code this build does not know about
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// Whether this code reports a bad input value
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorCode::MissingParameters
                | ErrorCode::InvalidParameterType
                | ErrorCode::NegativeInitialSavings
                | ErrorCode::NegativeMonthlyDeposit
                | ErrorCode::NegativeInterestRate
                | ErrorCode::InvalidYears
                | ErrorCode::ExcessiveInitialSavings
                | ErrorCode::ExcessiveMonthlyDeposit
                | ErrorCode::ExcessiveInterestRate
                | ErrorCode::ExcessiveYears
                | ErrorCode::InvalidRequestBody
        )
    }
}

/// `{error, message, details?, retryAfter?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: ErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
}

impl ErrorBody {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            retry_after: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Look up a key inside `details`
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref()?.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codes_use_screaming_snake_case() {
        let body = ErrorBody::new(ErrorCode::ExcessiveInitialSavings, "too much");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"], json!("EXCESSIVE_INITIAL_SAVINGS"));
        assert!(value.get("details").is_none());
        assert!(value.get("retryAfter").is_none());
    }

    #[test]
    fn test_unknown_code_is_tolerated() {
        let body: ErrorBody =
            serde_json::from_value(json!({ "error": "Too many requests" })).unwrap();
        assert_eq!(body.error, ErrorCode::Unknown);
        assert_eq!(body.message, "");
    }

    #[test]
    fn test_detail_lookup() {
        let body = ErrorBody::new(ErrorCode::ExcessiveYears, "x")
            .with_details(json!({ "maxAllowed": 100 }));
        assert_eq!(body.detail("maxAllowed"), Some(&json!(100)));
        assert_eq!(body.detail("value"), None);
        assert!(ErrorCode::ExcessiveYears.is_validation());
        assert!(!ErrorCode::TooManyRequests.is_validation());
    }
}
