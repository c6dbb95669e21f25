//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::PgPool;

use crate::backend::{BackendClient, BackendError};
use crate::config::StorefrontConfig;
use crate::middleware::security_headers::content_security_policy;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured content backend URL is unusable.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.api_url)?;
        let csp = content_security_policy(&config.api_url);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                csp,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the content backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Content-Security-Policy header value, computed once at startup.
    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.inner.csp
    }
}
