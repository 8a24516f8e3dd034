//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//! - `AUTH_URL` - Base URL of the authentication provider (e.g., `https://xyz.example.co`)
//! - `AUTH_API_KEY` - Provider API key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `AUTH_TIMEOUT_SECS` - Token verification timeout (default: 10)
//! - `CART_STORE` - Cart store backend, `postgres` or `rest` (default: postgres)
//! - `CART_PROFILE_WAIT_ATTEMPTS` - Profile lookups before creating the cart anyway (default: 5)
//! - `CART_PROFILE_WAIT_INTERVAL_MS` - Pause after each profile lookup miss (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.1)
//!
//! ## Required when `CART_STORE=rest`
//! - `STORE_REST_URL` - Base URL of the hosted platform (e.g., `https://xyz.example.co`)
//! - `STORE_REST_API_KEY` - Platform API key
//! - `STORE_REST_TIMEOUT_SECS` - Request timeout (optional, default: 10)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tower_sessions::cookie::Key;
use url::Url;

use crate::services::ProfileWait;
use crate::services::cart::{DEFAULT_PROFILE_WAIT_ATTEMPTS, DEFAULT_PROFILE_WAIT_INTERVAL};

/// Cookie signing keys are derived from at least 64 bytes.
const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Authentication provider used to verify access tokens
    pub auth: AuthConfig,
    /// Cart store and resolver configuration
    pub cart: CartConfig,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Authentication provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AuthConfig {
    /// Base URL of the authentication provider
    pub base_url: Url,
    /// Provider API key, sent as `apikey`
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Cart store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartStoreBackend {
    /// The storefront's own `PostgreSQL` database.
    Postgres,
    /// The hosted platform's REST interface.
    Rest(RestStoreConfig),
}

/// Cart resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Where carts and profiles are stored
    pub backend: CartStoreBackend,
    /// Bounds of the wait for a freshly provisioned profile
    pub profile_wait: ProfileWait,
}

/// Hosted REST store configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct RestStoreConfig {
    /// Base URL of the hosted platform
    pub base_url: Url,
    /// Platform API key, sent as `apikey` and bearer token
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for RestStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStoreConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PartialEq for RestStoreConfig {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
            && self.api_key.expose_secret() == other.api_key.expose_secret()
            && self.timeout == other.timeout
    }
}

impl Eq for RestStoreConfig {}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment name reported with events
    pub environment: Option<String>,
    /// Error event sample rate (0.0-1.0)
    pub sample_rate: f32,
    /// Performance trace sample rate (0.0-1.0)
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_parsed_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let auth = AuthConfig::from_env()?;
        let cart = CartConfig::from_env()?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            auth,
            cart,
            sentry,
        })
    }

    /// Derive the cookie signing key from the session secret.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if the secret is too short to
    /// derive a key from.
    pub fn session_key(&self) -> Result<Key, ConfigError> {
        Key::try_from(self.session_secret.expose_secret().as_bytes()).map_err(|e| {
            ConfigError::InsecureSecret("STOREFRONT_SESSION_SECRET".to_string(), e.to_string())
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CartConfig {
    /// Load the cart configuration from environment variables.
    ///
    /// Used by the storefront and the CLI.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if `CART_STORE=rest`
    /// and the REST settings are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match get_env_or_default("CART_STORE", "postgres").as_str() {
            "postgres" => CartStoreBackend::Postgres,
            "rest" => CartStoreBackend::Rest(RestStoreConfig::from_env()?),
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "CART_STORE".to_string(),
                    format!("expected 'postgres' or 'rest', got '{other}'"),
                ));
            }
        };

        let max_attempts = get_parsed_env_or_default::<u32>(
            "CART_PROFILE_WAIT_ATTEMPTS",
            &DEFAULT_PROFILE_WAIT_ATTEMPTS.to_string(),
        )?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_PROFILE_WAIT_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let interval_ms = get_parsed_env_or_default::<u64>(
            "CART_PROFILE_WAIT_INTERVAL_MS",
            &DEFAULT_PROFILE_WAIT_INTERVAL.as_millis().to_string(),
        )?;

        Ok(Self {
            backend,
            profile_wait: ProfileWait {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("AUTH_URL")?;
        let base_url = parse_http_url("AUTH_URL", &raw_url)?;
        let api_key = get_validated_secret("AUTH_API_KEY")?;
        let timeout_secs = get_parsed_env_or_default::<u64>("AUTH_TIMEOUT_SECS", "10")?;

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl RestStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("STORE_REST_URL")?;
        let base_url = parse_http_url("STORE_REST_URL", &raw_url)?;
        let api_key = get_validated_secret("STORE_REST_API_KEY")?;
        let timeout_secs = get_parsed_env_or_default::<u64>("STORE_REST_TIMEOUT_SECS", "10")?;

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_sample_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// Also used by the CLI, which connects to the same database.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., STOREFRONT_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable with a default value.
fn get_parsed_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

/// Parse a raw configuration value.
fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a sample rate in the range 0.0-1.0.
fn get_sample_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate = get_parsed_env_or_default::<f32>(key, default)?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Parse an absolute `http`/`https` URL.
fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be an http(s) URL (got '{raw}')"),
        ));
    }
    Ok(url)
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(64));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());

        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u32>("CART_PROFILE_WAIT_ATTEMPTS", "five").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_PROFILE_WAIT_ATTEMPTS")
        );
        assert_eq!(parse_value::<u64>("X", "500").unwrap(), 500);
    }

    #[test]
    fn test_parse_http_url() {
        let url = parse_http_url("STORE_REST_URL", "https://abc.example.co").unwrap();
        assert_eq!(url.host_str(), Some("abc.example.co"));

        assert!(parse_http_url("STORE_REST_URL", "ftp://abc.example.co").is_err());
        assert!(parse_http_url("STORE_REST_URL", "mailto:ops@example.co").is_err());
        assert!(parse_http_url("STORE_REST_URL", "not a url").is_err());
    }

    fn config_with_secret(secret: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from(secret),
            auth: AuthConfig {
                base_url: Url::parse("https://abc.example.co").unwrap(),
                api_key: SecretString::from("k3Y-9fQ2x7Lm4Rt8Zp1Wv6Nb"),
                timeout: Duration::from_secs(10),
            },
            cart: CartConfig {
                backend: CartStoreBackend::Postgres,
                profile_wait: ProfileWait::default(),
            },
            sentry: SentryConfig::default(),
        }
    }

    #[test]
    fn test_session_key_requires_64_bytes() {
        assert!(config_with_secret(&"x".repeat(64)).session_key().is_ok());
        assert!(matches!(
            config_with_secret(&"x".repeat(63)).session_key(),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_auth_config_debug_redacts_api_key() {
        let config = config_with_secret(&"x".repeat(64));
        let debug_output = format!("{:?}", config.auth);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3Y-9fQ2x7Lm4Rt8Zp1Wv6Nb"));
    }

    #[test]
    fn test_socket_addr() {
        let config = config_with_secret(&"x".repeat(64));

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_rest_config_debug_redacts_api_key() {
        let config = RestStoreConfig {
            base_url: Url::parse("https://abc.example.co").unwrap(),
            api_key: SecretString::from("super_secret_api_key_value"),
            timeout: Duration::from_secs(10),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("abc.example.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key_value"));
    }

    #[test]
    fn test_default_profile_wait_matches_documented_defaults() {
        let wait = ProfileWait::default();
        assert_eq!(wait.max_attempts, 5);
        assert_eq!(wait.interval, Duration::from_millis(500));
    }
}
