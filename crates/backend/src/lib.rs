//! Emporium content backend.
//!
//! A JSON API over the `cms` `PostgreSQL` schema: pages composed of sections,
//! posts, products, single-type configuration blobs, and the message/order
//! submission endpoints used by the storefront.
//!
//! The library exposes the router and repositories so the CLI can seed content
//! through the same lifecycle hooks the API uses.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod captcha;
pub mod config;
pub mod db;
pub mod error;
pub mod hooks;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub use config::BackendConfig;
pub use state::AppState;

/// Build the full application router with health checks, request ids and tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
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

/// Readiness check; 503 when the database is unreachable.
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
    use axum::http::{Method, Request};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;

    /// Router backed by a pool that never connects; database calls fail fast.
    fn test_app() -> Router {
        let config = BackendConfig::from_lookup(|key| {
            (key == "BACKEND_DATABASE_URL").then(|| "postgres://nobody@127.0.0.1:9/none".to_string())
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:9/none")
            .unwrap();
        app(AppState::new(config, pool))
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
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
    async fn test_invalid_sort_is_rejected_before_the_database() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/products?_sort=price;drop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_order_with_invalid_email_is_rejected() {
        let body = serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "not-an-email",
            "shippingCountry": "DE",
            "items": [{ "product": { "id": 1 }, "quantity": 1 }]
        });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/orders")
                    .header("content-type", "application/json")
                    .header("x-forwarded-for", "203.0.113.9")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_database_failure_hides_details() {
        let response = test_app()
            .oneshot(Request::builder().uri("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_routes_do_not_spend_submission_quota() {
        let app = test_app();
        for _ in 0..8 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/favicon.ico")
                        .header("x-forwarded-for", "203.0.113.50")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/orders")
                    .header("content-type", "application/json")
                    .header("x-forwarded-for", "203.0.113.50")
                    .body(Body::from(r#"{"firstName":"Ada","lastName":"Lovelace","email":"nope","shippingCountry":"DE","items":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
