//! Database operations for the content store.
//!
//! # Schema: `cms`
//!
//! ## Tables
//!
//! - `pages` - Section-composed pages, addressed by `path`
//! - `posts` - Blog posts with derived `identifier` and `duration`
//! - `products` - Shop products with derived `identifier`
//! - `single_types` - One JSONB blob per configuration type (`global`, `shop`, ...)
//! - `messages` - Contact-form submissions
//! - `orders` - Checkout submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/backend/migrations/` and run via:
//! ```bash
//! emporium-cli migrate backend
//! ```

pub mod messages;
pub mod orders;
pub mod pages;
pub mod posts;
pub mod products;
pub mod single_types;

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use messages::MessageRepository;
pub use orders::OrderRepository;
pub use pages::{NewPage, PageRepository};
pub use posts::{NewPost, PostRepository, PostUpdate};
pub use products::{NewProduct, ProductRepository, ProductUpdate};
pub use single_types::{SingleType, SingleTypeRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate identifier).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Decode an optional JSONB column into a typed value.
pub(crate) fn decode_json<T: DeserializeOwned>(
    value: Option<serde_json::Value>,
    column: &str,
) -> Result<Option<T>, RepositoryError> {
    value
        .filter(|v| !v.is_null())
        .map(|v| {
            serde_json::from_value(v).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid {column} JSON: {e}"))
            })
        })
        .transpose()
}

/// Resolve a requested sort column against a whitelist.
pub(crate) fn sort_column(
    sort: Option<&emporium_core::Sort>,
    allowed: &[&'static str],
) -> Option<(&'static str, &'static str)> {
    let sort = sort?;
    allowed
        .iter()
        .find(|column| **column == sort.field)
        .map(|column| (*column, sort.direction.as_sql()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::Sort;

    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lamp"), "%lamp%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_sort_column_whitelist() {
        let allowed = &["name", "price"];
        assert_eq!(
            sort_column(Some(&Sort::desc("price")), allowed),
            Some(("price", "DESC"))
        );
        assert_eq!(sort_column(Some(&Sort::asc("password")), allowed), None);
        assert_eq!(sort_column(None, allowed), None);
    }

    #[test]
    fn test_decode_json_reports_column() {
        let bad = Some(serde_json::json!({ "url": 5 }));
        let err = decode_json::<emporium_core::Image>(bad, "image").unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("image")));
        assert!(decode_json::<emporium_core::Image>(None, "image").unwrap().is_none());
        assert!(
            decode_json::<emporium_core::Image>(Some(serde_json::Value::Null), "image")
                .unwrap()
                .is_none()
        );
    }
}
