//! Emporium storefront.
//!
//! Server-rendered shop and blog on top of the content backend: CMS pages
//! built from sections, a product catalogue, a session cart with checkout,
//! contact and cookie-consent forms. HTMX drives the partial updates.
//!
//! The library exposes the router so it can be exercised without a listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod filters;
pub mod layout;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod routes;
pub mod sections;
pub mod state;
pub mod views;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub use config::StorefrontConfig;
pub use state::AppState;

/// Directory holding stylesheets and scripts served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router: pages, static files, `PostgreSQL`
/// sessions, security headers, request ids and tracing.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    app_with_session_layer(state, session_layer)
}

/// Build the application router on top of any session store.
pub fn app_with_session_layer<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check; 503 when the session database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;

    /// Router whose database and content backend are both unreachable.
    fn test_app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://nobody@127.0.0.1:9/none".to_string()),
            "STOREFRONT_API_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:9/none")
            .unwrap();
        app(AppState::new(config, pool).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let response = test_app()
            .oneshot(Request::builder().uri("/static/js/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreachable_backend_renders_error_page() {
        let response = test_app()
            .oneshot(Request::builder().uri("/about-us").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("502"));
    }
}
