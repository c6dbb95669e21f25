//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - CMS page `index`
//! GET  /{*path}                - CMS page by path (nested paths allowed)
//!
//! # Products
//! GET  /products               - Product listing
//! GET  /products/{identifier}  - Product detail
//!
//! # Blog
//! GET  /blog                   - First page of posts (?q=&topic=)
//! GET  /blog/items             - Next page fragment (HTMX, ?page=&q=&topic=)
//! GET  /blog/{identifier}      - Post detail
//!
//! # Cart (HTMX fragments, redirects without HTMX)
//! GET  /cart                   - Cart page with checkout form
//! POST /cart/add               - Add a product
//! POST /cart/update            - Change a line quantity
//! POST /cart/remove            - Remove a line
//! POST /cart/shipping          - Choose the shipping country
//! GET  /cart/count             - Cart count badge
//!
//! # Forms
//! POST /checkout               - Submit the order
//! POST /contact                - Submit a contact message
//! POST /cookies                - Store cookie consent
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod cookies;
pub mod pages;
pub mod products;

use axum::{
    Router,
    http::{HeaderMap, HeaderValue, StatusCode, header::REFERER},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use url::Url;

use crate::middleware::{cart_rate_limiter, form_rate_limiter};
use crate::models::Flash;
use crate::notifications::{HX_RESWAP, HxTrigger, push_flash};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{identifier}", get(products::show))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/items", get(blog::items))
        .route("/{identifier}", get(blog::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/shipping", post(cart::shipping))
        .route_layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Form submissions forwarded to the content backend.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::submit))
        .route("/contact", post(contact::submit))
        .route_layer(form_rate_limiter())
        .route("/cookies", post(cookies::accept))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .nest("/products", product_routes())
        .nest("/blog", blog_routes())
        .nest("/cart", cart_routes())
        .merge(form_routes())
        .route("/{*path}", get(pages::show))
        .fallback(pages::not_found)
}

// =============================================================================
// Shared Responses
// =============================================================================

/// Same-site path of the page that issued the request, or `fallback`.
///
/// Only the path and query of the `Referer` are kept so a redirect can never
/// leave the site.
#[must_use]
pub fn back_path(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        })
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| fallback.to_owned())
}

/// Report a refused or failed form action without replacing any content.
///
/// HTMX requests get a `notify` event and `HX-Reswap: none`; plain form posts
/// get a flash and a redirect to `back_to`.
pub async fn notify_only(htmx: bool, session: &Session, flash: Flash, back_to: &str) -> Response {
    if htmx {
        let mut headers = HxTrigger::new().notify(&flash).headers();
        headers.insert(HX_RESWAP, HeaderValue::from_static("none"));
        (StatusCode::OK, headers).into_response()
    } else {
        push_flash(session, flash).await;
        Redirect::to(back_to).into_response()
    }
}
