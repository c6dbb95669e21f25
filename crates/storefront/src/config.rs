//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for sessions
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:{port}`)
//! - `STOREFRONT_API_URL` - Content backend URL (default: `http://localhost:1337`)
//! - `STOREFRONT_PAGE_SIZE` - Blog page size (default: 30)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0 to 1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default number of items per blog page.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` URL of the session store (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Base URL of the content backend
    pub api_url: String,
    /// Items per page for infinite lists
    pub page_size: u32,
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl StorefrontConfig {
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
        let database_url = lookup("STOREFRONT_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;

        let host = parse_var(&lookup, "STOREFRONT_HOST", "127.0.0.1")?;
        let port: u16 = parse_var(&lookup, "STOREFRONT_PORT", "3000")?;
        let base_url = lookup("STOREFRONT_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let api_url = lookup("STOREFRONT_API_URL")
            .unwrap_or_else(|| "http://localhost:1337".to_string());
        url::Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), e.to_string())
        })?;

        let page_size: u32 = parse_var(&lookup, "STOREFRONT_PAGE_SIZE", "30")?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size,
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_var(&lookup, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_var(&lookup, "SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(move |key| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/sessions")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api_url, "http://localhost:1337");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let config = config(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/sessions"),
            ("STOREFRONT_API_URL", "https://cms.example.com/"),
            ("STOREFRONT_BASE_URL", "https://shop.example.com/"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://cms.example.com");
        assert_eq!(config.base_url, "https://shop.example.com");
        assert!(config.is_secure());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingEnvVar(_))));
        assert!(matches!(
            config(&[("DATABASE_URL", "postgres://x"), ("STOREFRONT_PAGE_SIZE", "0")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PAGE_SIZE"
        ));
        assert!(matches!(
            config(&[("DATABASE_URL", "postgres://x"), ("STOREFRONT_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_API_URL"
        ));
    }
}
