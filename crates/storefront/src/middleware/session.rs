//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session holds
//! the cart blob, the chosen shipping country and pending flash messages.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "emporium_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by the storefront migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
