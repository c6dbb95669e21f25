//! HTTP route handlers for the content API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /pages/{path}           - Page with its sections
//! GET  /global                 - Navigation, footer, logo
//! GET  /integrations           - Analytics/chat/captcha settings (no secrets)
//! GET  /cookies                - Cookie banner configuration
//! GET  /shop                   - Currency, quantity limit, shipping tiers
//!
//! GET  /products               - Product listing (no details)
//! GET  /products/{identifier}  - Product by identifier or numeric id
//!
//! GET  /posts                  - Post listing (no content)
//! GET  /posts/count            - Number of posts matching the filters
//! GET  /posts/{identifier}     - Full post
//!
//! POST /messages?captchaToken  - Contact form submission (rate limited)
//! POST /orders?captchaToken    - Checkout submission (rate limited)
//! ```

pub mod content;
pub mod posts;
pub mod products;
pub mod submissions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::submission_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{identifier}", get(products::show))
}

/// Create the post routes router.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::index))
        .route("/count", get(posts::count))
        .route("/{identifier}", get(posts::show))
}

/// Create the rate-limited submission routes router.
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(submissions::create_message))
        .route("/orders", post(submissions::create_order))
        .route_layer(submission_rate_limiter())
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pages/{*path}", get(content::page))
        .route("/global", get(content::global))
        .route("/integrations", get(content::integrations))
        .route("/cookies", get(content::cookies))
        .route("/shop", get(content::shop))
        .nest("/products", product_routes())
        .nest("/posts", post_routes())
        .merge(submission_routes())
}
