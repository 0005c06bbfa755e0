//! Sending calculation requests to the backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use thiserror::Error;

use super::messages::{self, ErrorCategory};
use crate::calculation::{CalculationParams, CalculationResponse};
use crate::error::{ErrorBody, ErrorCode};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A failed calculation request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status
    #[error("backend returned {status}: {:?}", .body.error)]
    Api { status: u16, body: ErrorBody },

    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// A success response that could not be decoded
    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid backend URL {0:?}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Api { body, .. } => ErrorCategory::from_code(body.error),
            ClientError::Network(_) => ErrorCategory::Network,
            ClientError::Decode(_) | ClientError::InvalidBaseUrl(_) => ErrorCategory::Other,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { body, .. } => Some(body.error),
            _ => None,
        }
    }

    /// Message to show the user
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { body, .. } => messages::user_message(body),
            ClientError::Network(_) => messages::NETWORK_MESSAGE.to_string(),
            ClientError::Decode(_) | ClientError::InvalidBaseUrl(_) => {
                messages::FALLBACK_MESSAGE.to_string()
            }
        }
    }
}

/// Anything that can turn parameters into a projection
#[async_trait]
pub trait CalculationTransport: Send + Sync {
    async fn calculate(&self, params: &CalculationParams) -> Result<CalculationResponse, ClientError>;
}

/// JSON-over-HTTP transport against `POST {base}/api/calculations`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("/api/calculations"))
            .map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CalculationTransport for HttpTransport {
    async fn calculate(&self, params: &CalculationParams) -> Result<CalculationResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(params)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<CalculationResponse>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let body = serde_json::from_slice::<ErrorBody>(&bytes).unwrap_or_else(|e| {
            log::warn!("Undecodable error body from {}: {}", self.endpoint, e);
            ErrorBody::new(ErrorCode::Unknown, "")
        });

        Err(ClientError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
