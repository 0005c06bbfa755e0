//! AWS Lambda handler serving the calculator API
//!
//! Accepts Lambda Function URL events and answers with the same routes, bodies
//! and status codes as the standalone server. Rate limiting is left to the
//! function URL's throttling settings.

use std::sync::Arc;
use std::time::Instant;

use aws_lambda_events::event::lambda_function_urls::{
    LambdaFunctionUrlRequest, LambdaFunctionUrlResponse,
};
use http::{header, HeaderMap, HeaderValue};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use savings_calculator::api::handlers::HealthResponse;
use savings_calculator::api::{service, ApiError};
use savings_calculator::config::CorsConfig;
use savings_calculator::{ProjectionEngine, ServerConfig};

const CALCULATION_PATHS: [&str; 2] = ["/api/calculations", "/api/get-calculation"];
const HEALTH_PATH: &str = "/api/health";

struct HandlerState {
    engine: ProjectionEngine,
    cors: CorsConfig,
    started_at: Instant,
}

fn cors_headers(cors: &CorsConfig, request_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let origin = request_headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    if let Some(origin) = origin {
        if cors.is_allowed(origin) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(header::VARY, HeaderValue::from_static("origin"));
                if cors.allow_credentials {
                    headers.insert(
                        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                        HeaderValue::from_static("true"),
                    );
                }
            }
        } else {
            log::warn!("Origin {:?} not allowed by CORS", origin);
        }
    }
    headers
}

fn respond(status: u16, mut headers: HeaderMap, body: Option<String>) -> LambdaFunctionUrlResponse {
    if body.is_some() {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    LambdaFunctionUrlResponse {
        status_code: i64::from(status),
        headers,
        body,
        is_base64_encoded: false,
        cookies: Vec::new(),
    }
}

fn error_response(err: &ApiError, headers: HeaderMap) -> LambdaFunctionUrlResponse {
    match err {
        ApiError::Internal(detail) => log::error!("Request failed: {}", detail),
        other => log::warn!("Request rejected ({:?}): {}", other.code(), other),
    }
    let body = serde_json::to_string(&err.to_body()).ok();
    respond(err.status().as_u16(), headers, body)
}

fn to_json<T: serde::Serialize>(value: &T, headers: HeaderMap) -> LambdaFunctionUrlResponse {
    match serde_json::to_string(value) {
        Ok(json) => respond(200, headers, Some(json)),
        Err(e) => error_response(&ApiError::Internal(e.to_string()), headers),
    }
}

fn calculate(
    state: &HandlerState,
    request: &LambdaFunctionUrlRequest,
    headers: HeaderMap,
) -> LambdaFunctionUrlResponse {
    if request.is_base64_encoded {
        let err = ApiError::InvalidBody("binary request bodies are not supported".to_string());
        return error_response(&err, headers);
    }

    let body = request.body.as_deref().unwrap_or("");
    match service::calculate(&state.engine, body.as_bytes()) {
        Ok(response) => to_json(&response, headers),
        Err(err) => error_response(&err, headers),
    }
}

fn handle(state: &HandlerState, request: &LambdaFunctionUrlRequest) -> LambdaFunctionUrlResponse {
    let mut headers = cors_headers(&state.cors, &request.headers);
    let method = request
        .request_context
        .http
        .method
        .as_deref()
        .unwrap_or("GET")
        .to_ascii_uppercase();
    let path = request
        .raw_path
        .as_deref()
        .or(request.request_context.http.path.as_deref())
        .unwrap_or("/");
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    // CORS preflight
    if method == "OPTIONS" {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        );
        return respond(204, headers, None);
    }

    let allowed = if path == HEALTH_PATH {
        "GET"
    } else if CALCULATION_PATHS.contains(&path) {
        "POST"
    } else {
        return error_response(&ApiError::NotFound(path.to_string()), headers);
    };

    if method != allowed {
        headers.insert(header::ALLOW, HeaderValue::from_static(allowed));
        let err = ApiError::MethodNotAllowed {
            method,
            path: path.to_string(),
        };
        return error_response(&err, headers);
    }

    match path {
        HEALTH_PATH => to_json(&HealthResponse::since(state.started_at), headers),
        _ => calculate(state, request, headers),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(HandlerState {
        engine: ProjectionEngine::new(config.limits),
        cors: config.cors,
        started_at: Instant::now(),
    });

    run(service_fn(move |event: LambdaEvent<LambdaFunctionUrlRequest>| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Error>(handle(&state, &event.payload)) }
    }))
    .await
}
