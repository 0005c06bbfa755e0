use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::calculation::ValidationError;
use crate::error::{ErrorBody, ErrorCode};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Details attached to a rate-limit rejection
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitInfo {
    pub limit_per_window: u32,
    pub window_minutes: u64,
    /// Epoch milliseconds at which the current window ends
    pub reset_at_ms: i64,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("No route for {0}")]
    NotFound(String),

    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("You have exceeded the rate limit. Please try again later.")]
    RateLimited(RateLimitInfo),

    #[error("Failed to calculate compound interest")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(e) => e.code(),
            ApiError::InvalidBody(_) => ErrorCode::InvalidRequestBody,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::MethodNotAllowed { .. } => ErrorCode::MethodNotAllowed,
            ApiError::RateLimited(_) => ErrorCode::TooManyRequests,
            ApiError::Internal(_) => ErrorCode::ServerError,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(e) => e.to_body(),
            ApiError::InvalidBody(_)
            | ApiError::NotFound(_)
            | ApiError::MethodNotAllowed { .. } => ErrorBody::new(self.code(), self.to_string()),
            ApiError::RateLimited(info) => ErrorBody {
                retry_after: Some(format!("{} minutes", info.window_minutes)),
                ..ErrorBody::new(self.code(), self.to_string()).with_details(json!({
                    "limitPerWindow": info.limit_per_window,
                    "windowDurationMinutes": info.window_minutes,
                    "rateLimitReset": info.reset_at_ms,
                }))
            },
            ApiError::Internal(detail) => {
                ErrorBody::new(self.code(), self.to_string()).with_details(json!(detail))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(detail) => log::error!("Request failed: {}", detail),
            other => log::warn!("Request rejected ({:?}): {}", other.code(), other),
        }

        (self.status(), Json(self.to_body())).into_response()
    }
}
