//! API error type with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! shape storefront clients already parse:
//! `{"statusCode": 400, "error": "Bad Request", "message": "invalid captcha"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use emporium_core::ValidationError;

use crate::db::RepositoryError;

/// Application-level error type for the content API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Submitted entity failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Captcha token was missing, rejected or could not be verified.
    #[error("invalid captcha")]
    InvalidCaptcha,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error: &'static str,
    message: String,
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::InvalidCaptcha | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Client-facing message; internal details are never exposed.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::InvalidCaptcha => "invalid captcha".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb describing a submission step.
pub fn add_breadcrumb(category: &str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("page".to_string());
        assert_eq!(err.to_string(), "Not found: page");
        assert_eq!(AppError::InvalidCaptcha.to_string(), "invalid captcha");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::InvalidCaptcha.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Validation(ValidationError::EmptyOrder).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("post identifier already exists".into()))
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_invalid_captcha_body() {
        let (status, body) = body_json(AppError::InvalidCaptcha).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], "invalid captcha");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret column".into()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
