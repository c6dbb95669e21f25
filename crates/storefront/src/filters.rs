//! Markdown rendering and custom Askama template filters.

use std::fmt::Display;

use comrak::{Options, markdown_to_html};

/// Render CMS Markdown to HTML.
///
/// Raw HTML in the source is escaped, not passed through.
#[must_use]
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.superscript = true;
    options.extension.footnotes = true;

    markdown_to_html(source, &options)
}

/// Render optional Markdown; `None` and blank text render as nothing.
#[must_use]
pub fn render_optional_markdown(source: Option<&str>) -> String {
    source
        .filter(|text| !text.trim().is_empty())
        .map(render_markdown)
        .unwrap_or_default()
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders Markdown to HTML; pair with `|safe`.
///
/// Usage in templates: `{{ post.content|markdown|safe }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn markdown(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(render_markdown(&value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_gfm() {
        let html = render_markdown("# Title\n\n~~old~~ **new**");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<strong>new</strong>"));
    }

    #[test]
    fn test_raw_html_is_not_passed_through() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_optional_markdown_blank() {
        assert_eq!(render_optional_markdown(None), "");
        assert_eq!(render_optional_markdown(Some("  ")), "");
        assert!(render_optional_markdown(Some("hi")).contains("<p>hi</p>"));
    }
}
