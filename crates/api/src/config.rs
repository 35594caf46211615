//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FRESHCART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AUTH_INIT_POSTURE` - `strict` or `resilient` (not needed in development mode)
//!
//! ## Optional
//! - `FRESHCART_HOST` - Bind address (default: 127.0.0.1)
//! - `FRESHCART_PORT` - Listen port (default: 8080)
//! - `AUTH_DEVELOPMENT_MODE` - Disable authentication entirely (default: false)
//! - `FIREBASE_SERVICE_ACCOUNT_FILE` - Service-credential bundle for token verification
//! - `AUTH_EXEMPT_PATHS` - Comma-separated public paths, `/**` suffix for prefixes
//! - `FIREBASE_JWKS_URL` - Signing-key endpoint (default: Google securetoken JWKs)
//! - `FIREBASE_KEYS_TTL_SECS` - Signing-key cache TTL (default: 3600)
//! - `FIREBASE_KEYS_REFRESH_SECS` - Minimum gap between unknown-`kid` refetches (default: 60)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins
//! - `CORS_ALLOWED_METHODS` - Comma-separated methods
//! - `CORS_ALLOWED_HEADERS` - Comma-separated request headers
//! - `CORS_MAX_AGE_SECS` - Preflight cache lifetime (default: 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use secrecy::SecretString;
use thiserror::Error;

use crate::identity::DEFAULT_JWKS_URL;
use crate::middleware::auth::{AuthMode, DEFAULT_EXEMPT_PATHS, ExemptPaths};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,https://www.fresh-cart.live";
const DEFAULT_CORS_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const DEFAULT_CORS_HEADERS: &str = "Authorization,Content-Type,Origin,Accept,X-Requested-With";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What the gate should do if the identity provider client cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPosture {
    /// Refuse to start.
    Strict,
    /// Log a warning and admit every request, as in development mode.
    Resilient,
}

impl FromStr for InitPosture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "resilient" => Ok(Self::Resilient),
            other => Err(format!("expected 'strict' or 'resilient', got '{other}'")),
        }
    }
}

/// Top-level API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Authentication gate settings
    pub auth: AuthConfig,
    /// Cross-origin settings for browser clients
    pub cors: CorsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Authentication gate configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Resolved once from the development flag and the init posture.
    pub mode: AuthMode,
    /// Path to the identity provider's service-credential bundle.
    pub service_account_file: Option<PathBuf>,
    /// Endpoint serving the provider's token signing keys.
    pub jwks_url: String,
    /// How long fetched signing keys are trusted before refetching.
    pub keys_ttl: Duration,
    /// Minimum time between early refetches caused by an unknown key id.
    pub keys_refresh_interval: Duration,
    /// Paths reachable without a credential.
    pub exempt_paths: ExemptPaths,
}

/// CORS configuration for the web client.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<HeaderValue>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<HeaderName>,
    pub max_age: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FRESHCART_DATABASE_URL")?;
        let host = parse_env("FRESHCART_HOST", "127.0.0.1")?;
        let port = parse_env("FRESHCART_PORT", "8080")?;

        let auth = AuthConfig::from_env()?;
        let cors = CorsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            cors,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let development_mode = parse_bool(
            "AUTH_DEVELOPMENT_MODE",
            &get_env_or_default("AUTH_DEVELOPMENT_MODE", "false"),
        )?;
        let posture = get_optional_env("AUTH_INIT_POSTURE")
            .map(|raw| {
                raw.parse::<InitPosture>()
                    .map_err(|e| ConfigError::InvalidEnvVar("AUTH_INIT_POSTURE".to_string(), e))
            })
            .transpose()?;
        let mode = resolve_mode(development_mode, posture)?;

        // A missing bundle path is a credential-loading failure, so it is left
        // to the gate's init posture rather than rejected here.
        let service_account_file =
            get_optional_env("FIREBASE_SERVICE_ACCOUNT_FILE").map(PathBuf::from);
        let keys_ttl_secs: u64 = parse_env("FIREBASE_KEYS_TTL_SECS", "3600")?;
        let keys_refresh_secs: u64 = parse_env("FIREBASE_KEYS_REFRESH_SECS", "60")?;

        Ok(Self {
            mode,
            service_account_file,
            jwks_url: get_env_or_default("FIREBASE_JWKS_URL", DEFAULT_JWKS_URL),
            keys_ttl: Duration::from_secs(keys_ttl_secs),
            keys_refresh_interval: Duration::from_secs(keys_refresh_secs),
            exempt_paths: ExemptPaths::parse_list(&get_env_or_default(
                "AUTH_EXEMPT_PATHS",
                DEFAULT_EXEMPT_PATHS,
            )),
        })
    }
}

impl CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let allowed_origins =
            parse_origins(&get_env_or_default("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS))?;
        let allowed_methods = parse_list(
            "CORS_ALLOWED_METHODS",
            &get_env_or_default("CORS_ALLOWED_METHODS", DEFAULT_CORS_METHODS),
            |s| Method::from_bytes(s.to_ascii_uppercase().as_bytes()),
        )?;
        let allowed_headers = parse_list(
            "CORS_ALLOWED_HEADERS",
            &get_env_or_default("CORS_ALLOWED_HEADERS", DEFAULT_CORS_HEADERS),
            HeaderName::from_str,
        )?;
        let max_age_secs: u64 = parse_env("CORS_MAX_AGE_SECS", "3600")?;

        Ok(Self {
            allowed_origins,
            allowed_methods,
            allowed_headers,
            max_age: Duration::from_secs(max_age_secs),
        })
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_CORS_ORIGINS
                .split(',')
                .map(HeaderValue::from_static)
                .collect(),
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ORIGIN,
                axum::http::header::ACCEPT,
                HeaderName::from_static("x-requested-with"),
            ],
            max_age: Duration::from_secs(3600),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Turn the development flag and posture into the single mode the gate runs in.
///
/// The development flag wins. Otherwise the posture must be stated explicitly.
fn resolve_mode(
    development_mode: bool,
    posture: Option<InitPosture>,
) -> Result<AuthMode, ConfigError> {
    if development_mode {
        return Ok(AuthMode::DevelopmentOnly);
    }
    match posture {
        Some(InitPosture::Strict) => Ok(AuthMode::Strict),
        Some(InitPosture::Resilient) => Ok(AuthMode::Resilient),
        None => Err(ConfigError::MissingEnvVar("AUTH_INIT_POSTURE".to_string())),
    }
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag leniently (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Parse `CORS_ALLOWED_ORIGINS`.
///
/// Credentials are allowed, so a `*` wildcard is refused rather than handed
/// to the CORS layer.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = parse_list("CORS_ALLOWED_ORIGINS", raw, HeaderValue::from_str)?;
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::InvalidEnvVar(
            "CORS_ALLOWED_ORIGINS".to_string(),
            "'*' cannot be combined with credentials, list origins explicitly".to_string(),
        ));
    }
    Ok(origins)
}

/// Parse a comma-separated list, skipping blank entries.
fn parse_list<T, E, F>(key: &str, raw: &str, parse: F) -> Result<Vec<T>, ConfigError>
where
    F: Fn(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse(s).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{s}: {e}")))
        })
        .collect()
}
