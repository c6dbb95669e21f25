//! Lifecycle hooks for content entries.
//!
//! Repositories call these before writing so stored identifiers and reading
//! times always follow the editable fields they are derived from.

use chrono::{DateTime, Utc};

use emporium_core::ProductId;
use emporium_core::slug::{
    post_identifier, post_identifier_on_update, product_identifier, reading_duration,
};

/// Fields derived when a post is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDerived {
    pub identifier: String,
    pub duration: i32,
}

/// Fields re-derived by a post update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRederived {
    pub identifier: Option<String>,
    pub duration: Option<i32>,
}

/// Derive the identifier and reading time of a new post.
#[must_use]
pub fn before_post_create(title: &str, content: &str, now: DateTime<Utc>) -> PostDerived {
    PostDerived {
        identifier: post_identifier(title, now.timestamp_millis()),
        duration: reading_duration(content),
    }
}

/// Re-derive what a post update invalidates.
///
/// A new title re-slugs the identifier but keeps the creation timestamp
/// suffix of `previous_identifier`; new content recomputes the duration.
#[must_use]
pub fn before_post_update(
    title: Option<&str>,
    content: Option<&str>,
    previous_identifier: &str,
    now: DateTime<Utc>,
) -> PostRederived {
    PostRederived {
        identifier: title.map(|title| {
            post_identifier_on_update(title, Some(previous_identifier), now.timestamp_millis())
        }),
        duration: content.map(reading_duration),
    }
}

/// Identifier assigned once the product row id is known.
#[must_use]
pub fn after_product_create(name: &str, id: ProductId) -> String {
    product_identifier(name, id)
}

/// Identifier to store when a product update renames it.
#[must_use]
pub fn before_product_update(name: Option<&str>, id: ProductId) -> Option<String> {
    name.map(|name| product_identifier(name, id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_post_create_derives_identifier_and_duration() {
        let derived = before_post_create("Hello World", &"x".repeat(3201), at(1_700_000_000_123));
        assert_eq!(derived.identifier, "hello-world-1700000000123");
        assert_eq!(derived.duration, 3);
    }

    #[test]
    fn test_post_update_only_touches_changed_fields() {
        let unchanged = before_post_update(None, None, "hello-1", at(5));
        assert_eq!(unchanged, PostRederived::default());

        let retitled = before_post_update(Some("Goodbye"), None, "hello-world-1700", at(5));
        assert_eq!(retitled.identifier.as_deref(), Some("goodbye-1700"));
        assert_eq!(retitled.duration, None);

        let rewritten = before_post_update(None, Some("short"), "hello-1", at(5));
        assert_eq!(rewritten.identifier, None);
        assert_eq!(rewritten.duration, Some(1));
    }

    #[test]
    fn test_product_identifiers() {
        assert_eq!(after_product_create("Oak Table", ProductId::new(4)), "oak-table-4");
        assert_eq!(
            before_product_update(Some("Walnut Table"), ProductId::new(4)).as_deref(),
            Some("walnut-table-4")
        );
        assert_eq!(before_product_update(None, ProductId::new(4)), None);
    }
}
