use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, request::Parts, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::error::ApiError;
use super::rate_limit::{self, RateLimiter};
use super::handlers;
use crate::calculation::ProjectionEngine;
use crate::config::{CorsConfig, ServerConfig};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProjectionEngine>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            engine: Arc::new(ProjectionEngine::new(config.limits)),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            started_at: Instant::now(),
        }
    }
}

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    // Only calculation routes count against the rate limit
    let calculations = Router::new()
        .route("/api/calculations", post(handlers::calculate))
        .route("/api/get-calculation", post(handlers::calculate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    let mut router = Router::new()
        .route("/api/health", get(handlers::health))
        .merge(calculations)
        .with_state(state);

    if config.is_production() {
        log::info!("Serving static files from {}", config.static_dir);
        router = router.fallback_service(ServeDir::new(&config.static_dir));
    }

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed = config.clone();
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        let permitted = origin
            .to_str()
            .map(|o| allowed.is_allowed(o))
            .unwrap_or(false);
        if !permitted {
            log::warn!("Origin {:?} not allowed by CORS", origin);
        }
        permitted
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(config.allow_credentials)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown error".to_string()
    };

    ApiError::Internal(detail).into_response()
}
