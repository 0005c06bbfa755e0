//! Runtime configuration: validation window, server, CORS and rate limiting
//!
//! Values come from the environment (optionally seeded from a `.env` file)
//! with defaults matching a local development setup.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::calculation::Field;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value {value:?}: expected {expected}")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Inclusive min/max bounds for one input field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLimits {
    pub min: f64,
    pub max: f64,
}

impl FieldLimits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// The validation window for all four calculation inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub initial_savings: FieldLimits,
    pub monthly_deposit: FieldLimits,
    pub interest_rate: FieldLimits,
    pub years: FieldLimits,
}

impl Limits {
    /// Bounds for a given field
    pub fn for_field(&self, field: Field) -> FieldLimits {
        match field {
            Field::InitialSavings => self.initial_savings,
            Field::MonthlyDeposit => self.monthly_deposit,
            Field::InterestRate => self.interest_rate,
            Field::Years => self.years,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            initial_savings: FieldLimits::new(0.0, 1_000_000.0),
            monthly_deposit: FieldLimits::new(0.0, 10_000.0),
            // Percent, not a fraction
            interest_rate: FieldLimits::new(0.0, 20.0),
            years: FieldLimits::new(1.0, 100.0),
        }
    }
}

/// Fixed-window rate limiting settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    /// Identify clients by the first `X-Forwarded-For` hop instead of the socket address
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    pub fn window_minutes(&self) -> u64 {
        self.window.as_secs() / 60
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 50,
            trust_proxy: false,
        }
    }
}

/// Cross-origin settings
#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub limits: Limits,
    pub static_dir: String,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Load `.env` (if present) and read configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT", "a port number")?.unwrap_or(defaults.port);
        let environment = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or(defaults.environment);

        let cors = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => CorsConfig {
                allowed_origins: raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                ..defaults.cors
            },
            None => defaults.cors,
        };

        let window_secs: Option<u64> =
            parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS", "a number of seconds")?;
        let max_requests: Option<u32> =
            parse_var(&lookup, "RATE_LIMIT_MAX", "a request count")?;
        let trust_proxy: Option<bool> = parse_var(&lookup, "TRUST_PROXY", "true or false")?;

        let rate_limit = RateLimitConfig {
            window: window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit.window),
            max_requests: max_requests.unwrap_or(defaults.rate_limit.max_requests),
            trust_proxy: trust_proxy.unwrap_or(defaults.rate_limit.trust_proxy),
        };

        let static_dir = lookup("STATIC_DIR").unwrap_or(defaults.static_dir);

        Ok(Self {
            host,
            port,
            environment,
            cors,
            rate_limit,
            limits: defaults.limits,
            static_dir,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            environment: "development".to_string(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            limits: Limits::default(),
            static_dir: "client/build".to_string(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value, expected }),
    }
}
