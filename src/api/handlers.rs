use std::time::Instant;

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::router::AppState;
use super::service;
use crate::calculation::CalculationResponse;

/// POST /api/calculations (also mounted at /api/get-calculation)
/// Validates the body and returns the full projection
pub async fn calculate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CalculationResponse>> {
    let response = service::calculate(&state.engine, &body)?;
    Ok(Json(response))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
}

impl HealthResponse {
    /// Healthy status for a process that started at `started_at`
    pub fn since(started_at: Instant) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            uptime: started_at.elapsed().as_secs_f64(),
        }
    }
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::since(state.started_at))
}
