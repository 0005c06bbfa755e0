//! Mapping from backend error bodies to user-facing messages

use serde_json::Value;

use crate::calculation::Field;
use crate::error::{ErrorBody, ErrorCode};

/// Shown when the backend could not be reached at all
pub const NETWORK_MESSAGE: &str =
    "Unable to reach the calculation service. Please check your connection and try again.";

/// Fallback when the backend reply carries no usable message
pub const FALLBACK_MESSAGE: &str = "Failed to calculate";

/// Shown when a manual calculation is requested while the form is invalid
pub const FORM_INVALID_MESSAGE: &str =
    "Please fix the form errors before calculating. Check highlighted fields for specific issues.";

/// How a failed calculation should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    RateLimited,
    Server,
    Network,
    Other,
}

impl ErrorCategory {
    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::TooManyRequests => ErrorCategory::RateLimited,
            ErrorCode::ServerError => ErrorCategory::Server,
            code if code.is_validation() => ErrorCategory::Validation,
            _ => ErrorCategory::Other,
        }
    }

    /// Short heading for the error display
    pub fn title(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Validation Error",
            ErrorCategory::RateLimited => "Rate Limit Exceeded",
            ErrorCategory::Server | ErrorCategory::Other => "Calculation Error",
            ErrorCategory::Network => "Connection Error",
        }
    }
}

/// User-facing message for a backend error body
pub fn user_message(body: &ErrorBody) -> String {
    match body.error {
        ErrorCode::MissingParameters => {
            let params = body
                .detail("requiredParams")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!("Missing required parameters: {}", params)
        }
        ErrorCode::InvalidParameterType => format!("Invalid parameter type: {}", body.message),
        ErrorCode::NegativeInitialSavings => "Initial savings must be a positive number".to_string(),
        ErrorCode::NegativeMonthlyDeposit => "Monthly deposit must be a positive number".to_string(),
        ErrorCode::NegativeInterestRate => "Interest rate must be a positive number".to_string(),
        ErrorCode::InvalidYears => "Years must be greater than 0".to_string(),
        ErrorCode::ExcessiveInitialSavings => exceeds(body, Field::InitialSavings),
        ErrorCode::ExcessiveMonthlyDeposit => exceeds(body, Field::MonthlyDeposit),
        ErrorCode::ExcessiveInterestRate => exceeds(body, Field::InterestRate),
        ErrorCode::ExcessiveYears => exceeds(body, Field::Years),
        ErrorCode::ServerError => {
            let detail = match &body.details {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                _ => body.message.clone(),
            };
            format!("Server error: {}", detail)
        }
        ErrorCode::TooManyRequests => {
            let minutes = body
                .detail("windowDurationMinutes")
                .and_then(Value::as_u64)
                .unwrap_or(15);
            let limit = body
                .detail("limitPerWindow")
                .and_then(Value::as_u64)
                .unwrap_or(50);
            let retry = body
                .retry_after
                .clone()
                .unwrap_or_else(|| format!("{} minutes", minutes));
            format!(
                "Rate limit exceeded: {} You can make up to {} requests per {} minutes. Please try again in {}.",
                body.message, limit, minutes, retry
            )
        }
        ErrorCode::InvalidRequestBody
        | ErrorCode::NotFound
        | ErrorCode::MethodNotAllowed
        | ErrorCode::Unknown => raw_or_fallback(body),
    }
}

fn exceeds(body: &ErrorBody, field: Field) -> String {
    match body.detail("maxAllowed").and_then(Value::as_f64) {
        Some(max) => format!(
            "{} exceeds maximum allowed value of {}",
            field.label(),
            field.format_bound(max)
        ),
        None => raw_or_fallback(body),
    }
}

fn raw_or_fallback(body: &ErrorBody) -> String {
    if body.message.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        body.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_parameters_lists_required() {
        let body = ErrorBody::new(ErrorCode::MissingParameters, "Missing required parameters")
            .with_details(json!({
                "requiredParams": ["initialSavings", "monthlyDeposit", "interestRate", "years"],
                "missingParams": ["years"],
            }));
        assert_eq!(
            user_message(&body),
            "Missing required parameters: initialSavings, monthlyDeposit, interestRate, years"
        );
    }

    #[test]
    fn test_excessive_uses_bound_from_details() {
        let body = ErrorBody::new(ErrorCode::ExcessiveInitialSavings, "")
            .with_details(json!({"value": 2000000.0, "maxAllowed": 1000000.0}));
        assert_eq!(
            user_message(&body),
            "Initial savings exceeds maximum allowed value of $1,000,000"
        );

        let body = ErrorBody::new(ErrorCode::ExcessiveInterestRate, "")
            .with_details(json!({"maxAllowed": 20.0}));
        assert_eq!(user_message(&body), "Interest rate exceeds maximum allowed value of 20%");
    }

    #[test]
    fn test_rate_limit_message() {
        let body = ErrorBody {
            retry_after: Some("15 minutes".to_string()),
            ..ErrorBody::new(
                ErrorCode::TooManyRequests,
                "You have exceeded the rate limit. Please try again later.",
            )
            .with_details(json!({"limitPerWindow": 50, "windowDurationMinutes": 15}))
        };
        assert_eq!(
            user_message(&body),
            "Rate limit exceeded: You have exceeded the rate limit. Please try again later. \
             You can make up to 50 requests per 15 minutes. Please try again in 15 minutes."
        );
    }

    #[test]
    fn test_server_error_prefers_details() {
        let body = ErrorBody::new(ErrorCode::ServerError, "Failed to calculate compound interest")
            .with_details(json!("overflow"));
        assert_eq!(user_message(&body), "Server error: overflow");

        let body = ErrorBody::new(ErrorCode::ServerError, "Failed to calculate compound interest");
        assert_eq!(
            user_message(&body),
            "Server error: Failed to calculate compound interest"
        );
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let body: ErrorBody = serde_json::from_value(json!({"error": "SOMETHING_NEW"})).unwrap();
        assert_eq!(body.error, ErrorCode::Unknown);
        assert_eq!(user_message(&body), FALLBACK_MESSAGE);

        let body: ErrorBody =
            serde_json::from_value(json!({"error": "SOMETHING_NEW", "message": "Teapot"})).unwrap();
        assert_eq!(user_message(&body), "Teapot");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::TooManyRequests),
            ErrorCategory::RateLimited
        );
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::ExcessiveYears),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::from_code(ErrorCode::ServerError), ErrorCategory::Server);
        assert_eq!(ErrorCategory::from_code(ErrorCode::Unknown), ErrorCategory::Other);
    }
}
