//! Integration tests for Emporium.
//!
//! The storefront is driven in-process through its router. The content backend
//! is replaced by an `httpmock` server and sessions live in a `MemoryStore`,
//! so no database or running services are needed:
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, Response, header};
use httpmock::MockServer;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use emporium_storefront::middleware::session::SESSION_COOKIE_NAME;
use emporium_storefront::{AppState, StorefrontConfig, app_with_session_layer};

/// Client address sent with form posts so the rate limiters can key them.
pub const CLIENT_IP: &str = "203.0.113.7";

/// A storefront router talking to a mock content backend.
pub struct TestStorefront {
    pub backend: MockServer,
    app: Router,
}

impl TestStorefront {
    /// Start a mock backend and build a storefront pointed at it.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or state cannot be built.
    pub async fn start() -> Self {
        let backend = MockServer::start_async().await;
        let api_url = backend.base_url();

        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://nobody@127.0.0.1:9/none".to_string()),
            "STOREFRONT_API_URL" => Some(api_url.clone()),
            _ => None,
        })
        .expect("test configuration");
        // Never connected; sessions use the memory store below
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:9/none")
            .expect("lazy pool");

        let state = AppState::new(config, pool).expect("storefront state");
        let sessions = SessionManagerLayer::new(MemoryStore::default()).with_name(SESSION_COOKIE_NAME);
        let app = app_with_session_layer(state, sessions);

        Self { backend, app }
    }

    /// Mock the four single types the page layout reads.
    pub async fn mock_site(&self, shop: serde_json::Value) {
        for (path, body) in [
            ("/global", serde_json::json!({ "copyright": "Test Shop" })),
            ("/integrations", serde_json::json!({})),
            ("/cookies", serde_json::json!({ "enabled": false })),
            ("/shop", shop),
        ] {
            self.backend
                .mock_async(|when, then| {
                    when.method(httpmock::Method::GET).path(path);
                    then.status(200).json_body(body);
                })
                .await;
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails, which it never does for valid requests.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("router response")
    }

    /// GET `uri`, optionally with a session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).expect("request")).await
    }

    /// POST a urlencoded form as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post_htmx(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("HX-Request", "true")
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_owned())).expect("request"))
            .await
    }
}

/// `name=value` of the session cookie set by `response`, if any.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| {
            value
                .strip_prefix(SESSION_COOKIE_NAME)
                .is_some_and(|rest| rest.starts_with('='))
        })
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body is not valid UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
