//! Fixed-window request limiting per client IP

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::{ApiError, RateLimitInfo};
use super::router::AppState;
use crate::config::RateLimitConfig;

/// Windows are pruned once the table grows past this many clients
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window resets
    pub reset_in: Duration,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `client` at the current instant
    pub fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Count a request from `client` at `now`
    pub fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let window_len = self.config.window;
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(client).or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) >= window_len {
            *window = Window { started: now, count: 0 };
        }

        // Rejected requests are not counted and do not move the window start
        let allowed = window.count < self.config.max_requests;
        if allowed {
            window.count += 1;
        }

        RateDecision {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_in: window_len.saturating_sub(now.duration_since(window.started)),
        }
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Identify the client: first `X-Forwarded-For` hop when trusted, else the peer address
pub fn client_ip(request: &Request, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "ratelimit-reset",
        HeaderValue::from(decision.reset_in.as_secs_f64().ceil() as u64),
    );
}

/// Middleware enforcing the limiter on the routes it wraps
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    let client = client_ip(&request, limiter.config().trust_proxy);
    let decision = limiter.check(client);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        log::warn!("Rate limit exceeded for {}", client);
        let reset_at = chrono::Utc::now()
            + chrono::Duration::from_std(decision.reset_in).unwrap_or_else(|_| chrono::Duration::zero());
        ApiError::RateLimited(RateLimitInfo {
            limit_per_window: decision.limit,
            window_minutes: limiter.config().window_minutes(),
            reset_at_ms: reset_at.timestamp_millis(),
        })
        .into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}
