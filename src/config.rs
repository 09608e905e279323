//! Centralized configuration for the identity token service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Longest token lifetime accepted by [`Config::validate`].
const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid TTL value
    #[error("Invalid token TTL: must be between 1 second and 365 days")]
    InvalidTtl,

    /// A timeout was zero
    #[error("Invalid timeout {0}: must be greater than 0")]
    InvalidTimeout(&'static str),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// PEM-encoded RSA private key used for signing
    pub private_key_path: PathBuf,
    /// PEM-encoded RSA public key used for verification
    pub public_key_path: PathBuf,
    /// Static file served on `/README.txt`
    pub readme_path: PathBuf,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Load keys once at startup instead of on every request
    pub key_preload: bool,
    /// Upper bound on a single key file read
    pub key_read_timeout: Duration,
    /// Upper bound on a single sign or verify step
    pub crypto_timeout: Duration,
    /// Upper bound on a whole HTTP request
    pub request_timeout: Duration,
    /// How long to drain in-flight requests on shutdown
    pub shutdown_timeout: Duration,
    /// Mark the token cookie `Secure`
    pub cookie_secure: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            private_key_path: PathBuf::from("private.pem"),
            public_key_path: PathBuf::from("public.pem"),
            readme_path: PathBuf::from("README.txt"),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            key_preload: false,
            key_read_timeout: Duration::from_millis(2000),
            crypto_timeout: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(30),
            cookie_secure: true,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the resulting
    /// configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT", defaults.port)?,
            private_key_path: env::var("PRIVATE_KEY_PATH")
                .map_or(defaults.private_key_path, PathBuf::from),
            public_key_path: env::var("PUBLIC_KEY_PATH")
                .map_or(defaults.public_key_path, PathBuf::from),
            readme_path: env::var("README_PATH").map_or(defaults.readme_path, PathBuf::from),
            token_ttl: Duration::from_secs(parse_env(
                "TOKEN_TTL_SECS",
                defaults.token_ttl.as_secs(),
            )?),
            key_preload: parse_env("KEY_PRELOAD", defaults.key_preload)?,
            key_read_timeout: Duration::from_millis(parse_env("KEY_READ_TIMEOUT_MS", 2000)?),
            crypto_timeout: Duration::from_millis(parse_env("CRYPTO_TIMEOUT_MS", 2000)?),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 10)?),
            shutdown_timeout: Duration::from_secs(parse_env("SHUTDOWN_TIMEOUT_SECS", 30)?),
            cookie_secure: parse_env("COOKIE_SECURE", defaults.cookie_secure)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_env("LOG_JSON", defaults.log_json)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.token_ttl.is_zero() || self.token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::InvalidTtl);
        }
        if self.key_read_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("KEY_READ_TIMEOUT_MS"));
        }
        if self.crypto_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("CRYPTO_TIMEOUT_MS"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("REQUEST_TIMEOUT_SECS"));
        }
        if self.private_key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("PRIVATE_KEY_PATH"));
        }
        if self.public_key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("PUBLIC_KEY_PATH"));
        }
        Ok(())
    }

    /// Token lifetime in whole seconds, as written into the `exp` claim.
    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
