//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::captcha::CaptchaVerifier;
use crate::config::BackendConfig;

/// Shared application state.
///
/// Cheaply cloneable via internal `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BackendConfig,
    pool: PgPool,
    captcha: CaptchaVerifier,
}

impl AppState {
    /// Create application state; the captcha verifier targets the configured endpoint.
    #[must_use]
    pub fn new(config: BackendConfig, pool: PgPool) -> Self {
        let captcha = CaptchaVerifier::new(config.recaptcha_verify_url.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                captcha,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn captcha(&self) -> &CaptchaVerifier {
        &self.inner.captcha
    }
}
