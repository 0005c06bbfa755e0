//! HTTP surface: axum router, handlers, rate limiting and the shared
//! request service used by both the standalone server and the Lambda variant

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod router;
pub mod server;
pub mod service;

pub use error::{ApiError, Result};
pub use rate_limit::RateLimiter;
pub use router::{create_router, AppState};
pub use server::run_server;
