//! reCAPTCHA token verification.
//!
//! Verification fails closed: a missing token, a transport error, a non-200
//! reply or a body without `"success": true` all count as a failed captcha.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

/// Reasons a captcha token could not be confirmed.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha token missing")]
    MissingToken,
    #[error("invalid verify URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("verify endpoint returned status {0}")]
    Status(u16),
    #[error("invalid verify response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Client for the captcha provider's verify endpoint.
#[derive(Clone)]
pub struct CaptchaVerifier {
    inner: Arc<CaptchaVerifierInner>,
}

struct CaptchaVerifierInner {
    client: reqwest::Client,
    verify_url: String,
}

impl CaptchaVerifier {
    /// Create a verifier posting to `verify_url`.
    #[must_use]
    pub fn new(verify_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(CaptchaVerifierInner {
                client,
                verify_url: verify_url.into(),
            }),
        }
    }

    /// Whether `token` is accepted by the provider for `secret`.
    ///
    /// Every failure mode is logged and reported as `false`.
    pub async fn verify(&self, token: Option<&str>, secret: &str) -> bool {
        match self.try_verify(token, secret).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!("Captcha rejected by provider");
                false
            }
            Err(CaptchaError::MissingToken) => {
                tracing::info!("Captcha token missing");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Captcha verification failed");
                false
            }
        }
    }

    /// Ask the provider about `token`.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError` if the token is missing or the provider cannot be
    /// reached or understood.
    #[instrument(skip_all)]
    pub async fn try_verify(&self, token: Option<&str>, secret: &str) -> Result<bool, CaptchaError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CaptchaError::MissingToken)?;

        let mut url = url::Url::parse(&self.inner.verify_url)?;
        url.query_pairs_mut()
            .append_pair("secret", secret)
            .append_pair("response", token);

        let response = self.inner.client.post(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Captcha endpoint returned non-success status"
            );
            return Err(CaptchaError::Status(status.as_u16()));
        }

        let parsed: VerifyResponse = serde_json::from_str(&body)?;
        if !parsed.success && !parsed.error_codes.is_empty() {
            tracing::debug!(error_codes = ?parsed.error_codes, "Captcha error codes");
        }
        Ok(parsed.success)
    }
}
