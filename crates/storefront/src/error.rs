//! Handler errors and Sentry reporting.
//!
//! Most storefront handlers degrade to empty values or a notification instead
//! of failing. [`AppError`] covers what is left: the session cart cannot be
//! read or written, or a backend call a handler cannot do without failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::cart::CartStoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Cart store error: {0}")]
    CartStore(#[from] CartStoreError),
}

impl AppError {
    /// Backend 404s stay 404; other backend failures are a bad gateway.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::CartStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the visitor; details stay in the logs.
    const fn public_message(&self) -> &'static str {
        match self {
            Self::Backend(err) if err.is_not_found() => "Not found",
            Self::Backend(_) => "External service error",
            Self::CartStore(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Record a visitor action so Sentry reports show what led up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data: data
            .iter()
            .map(|(key, value)| ((*key).to_owned(), serde_json::Value::from(*value)))
            .collect(),
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_status(status: u16) -> AppError {
        AppError::Backend(BackendError::Status {
            status,
            message: "whatever".to_string(),
        })
    }

    #[test]
    fn test_backend_status_mapping() {
        assert_eq!(backend_status(404).status(), StatusCode::NOT_FOUND);
        assert_eq!(backend_status(503).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(backend_status(400).into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_details_are_not_exposed() {
        let err = AppError::CartStore(CartStoreError::Blob(emporium_core::CartBlobError::NotAnArray));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
