//! Identifier and reading-time derivation for CMS entries.
//!
//! Posts get `"{slug}-{unix millis}"` identifiers at creation; products get
//! `"{slug}-{id}"` once their row id is known. Both are re-derived when the
//! title or name changes.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ProductId;

/// Characters of content per minute of estimated reading time.
pub const CHARS_PER_MINUTE: usize = 1600;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("Invalid regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_]").expect("Invalid regex"));

/// Lowercase, turn each whitespace character into `-`, and drop anything
/// outside `[a-z0-9-_]`.
///
/// ```
/// use emporium_core::slug::slugify;
///
/// assert_eq!(slugify("Red Shoes (2024)!"), "red-shoes-2024");
/// assert_eq!(slugify("Café au lait"), "caf-au-lait");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let dashed = WHITESPACE_RE.replace_all(&lower, "-");
    DISALLOWED_RE.replace_all(&dashed, "").into_owned()
}

/// Identifier for a newly created post.
#[must_use]
pub fn post_identifier(title: &str, created_millis: i64) -> String {
    format!("{}-{created_millis}", slugify(title))
}

/// Identifier for a post whose title changed.
///
/// Keeps the numeric suffix of `previous` so existing links only change in
/// their title part; falls back to `now_millis` when there is none.
#[must_use]
pub fn post_identifier_on_update(title: &str, previous: Option<&str>, now_millis: i64) -> String {
    let suffix = previous
        .and_then(|identifier| identifier.rsplit('-').next())
        .filter(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()))
        .map_or_else(|| now_millis.to_string(), str::to_owned);

    format!("{}-{suffix}", slugify(title))
}

/// Identifier for a product, derived from its name and row id.
#[must_use]
pub fn product_identifier(name: &str, id: ProductId) -> String {
    format!("{}-{id}", slugify(name))
}

/// Estimated reading time in whole minutes, rounded up.
#[must_use]
pub fn reading_duration(content: &str) -> i32 {
    let minutes = content.chars().count().div_ceil(CHARS_PER_MINUTE);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  padded  "), "--padded--");
        assert_eq!(slugify("snake_case-kept"), "snake_case-kept");
        assert_eq!(slugify("a/b?c"), "abc");
    }

    #[test]
    fn test_post_identifier() {
        assert_eq!(
            post_identifier("My First Post", 1_700_000_000_000),
            "my-first-post-1700000000000"
        );
    }

    #[test]
    fn test_post_identifier_on_update_keeps_timestamp() {
        assert_eq!(
            post_identifier_on_update("Renamed", Some("old-title-1700000000000"), 42),
            "renamed-1700000000000"
        );
    }

    #[test]
    fn test_post_identifier_on_update_fresh_timestamp() {
        assert_eq!(post_identifier_on_update("Renamed", Some("old-title"), 42), "renamed-42");
        assert_eq!(post_identifier_on_update("Renamed", None, 42), "renamed-42");
        assert_eq!(post_identifier_on_update("Renamed", Some("trailing-"), 42), "renamed-42");
    }

    #[test]
    fn test_product_identifier() {
        assert_eq!(product_identifier("Desk Lamp XL", ProductId::new(17)), "desk-lamp-xl-17");
    }

    #[test]
    fn test_reading_duration() {
        assert_eq!(reading_duration(""), 0);
        assert_eq!(reading_duration("a"), 1);
        assert_eq!(reading_duration(&"a".repeat(1600)), 1);
        assert_eq!(reading_duration(&"a".repeat(1601)), 2);
        assert_eq!(reading_duration(&"ü".repeat(1600)), 1);
    }
}
