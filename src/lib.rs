//! Savings Calculator - compound-interest projection engine with an HTTP API
//!
//! This library provides:
//! - Input validation with typed, coded errors
//! - Month-by-month compound interest projection with yearly roll-ups
//! - An axum HTTP service (and a Lambda variant) with rate limiting and CORS
//! - A debounced client orchestrator for interactive front ends

pub mod config;
pub mod error;
pub mod calculation;
pub mod api;
pub mod client;

// Re-export commonly used types
pub use config::{Limits, ServerConfig};
pub use error::{ErrorBody, ErrorCode};
pub use calculation::{
    validate, CalculationParams, CalculationResponse, Field, ProjectionEngine, RawInput,
    ValidationError,
};
