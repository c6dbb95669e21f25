//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BACKEND_HOST` - Bind address (default: 127.0.0.1)
//! - `BACKEND_PORT` - Listen port (default: 1337)
//! - `BACKEND_PUBLIC_URL` - Public URL of the API (default: `http://localhost:{port}`)
//! - `RECAPTCHA_VERIFY_URL` - Captcha verification endpoint (default: Google siteverify)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0 to 1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Google's reCAPTCHA verification endpoint.
pub const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Backend application configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct BackendConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL of this API
    pub public_url: String,
    /// Endpoint used to verify captcha tokens
    pub recaptcha_verify_url: String,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_url", &self.public_url)
            .field("recaptcha_verify_url", &self.recaptcha_verify_url)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a value fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("BACKEND_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("BACKEND_DATABASE_URL".to_string()))?;

        let host: IpAddr = parse_or_default(&lookup, "BACKEND_HOST", "127.0.0.1")?;
        let port: u16 = parse_or_default(&lookup, "BACKEND_PORT", "1337")?;
        let public_url = lookup("BACKEND_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let recaptcha_verify_url = lookup("RECAPTCHA_VERIFY_URL")
            .unwrap_or_else(|| DEFAULT_RECAPTCHA_VERIFY_URL.to_string());
        let log_json = lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            host,
            port,
            public_url,
            recaptcha_verify_url,
            log_json,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_or_default(
                &lookup,
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.1",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse a variable, falling back to `default` when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            BackendConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/cms")]))
                .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:1337");
        assert_eq!(config.public_url, "http://localhost:1337");
        assert_eq!(config.recaptcha_verify_url, DEFAULT_RECAPTCHA_VERIFY_URL);
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let result = BackendConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_invalid_port() {
        let result = BackendConfig::from_lookup(lookup_from(&[
            ("BACKEND_DATABASE_URL", "postgres://localhost/cms"),
            ("BACKEND_PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "BACKEND_PORT"));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = BackendConfig::from_lookup(lookup_from(&[
            ("BACKEND_DATABASE_URL", "postgres://cms:hunter2@db/cms"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
        assert!(config.log_json);
    }
}
