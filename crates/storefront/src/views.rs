//! Flat display structs shared by templates.
//!
//! Templates only see plain strings; URL resolution and fallbacks happen here.

use emporium_core::{File, Image, ImageSize};

/// Resolve a media URL against the backend origin.
///
/// Uploads are stored with site-relative URLs (`/uploads/a.jpg`); absolute
/// URLs (CDN uploads) are kept as they are.
#[must_use]
pub fn media_url(media_base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
        url.to_owned()
    } else if url.starts_with('/') {
        format!("{media_base}{url}")
    } else {
        format!("{media_base}/{url}")
    }
}

/// Image display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    #[must_use]
    pub fn new(image: &Image, size: ImageSize, media_base: &str) -> Self {
        Self {
            url: media_url(media_base, image.url_for(size)),
            alt: image.alt().to_owned(),
        }
    }

    /// Convenience for optional images.
    #[must_use]
    pub fn from_option(image: Option<&Image>, size: ImageSize, media_base: &str) -> Option<Self> {
        image
            .filter(|image| !image.url.is_empty())
            .map(|image| Self::new(image, size, media_base))
    }
}

/// Downloadable file display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileView {
    pub name: String,
    pub url: String,
    pub caption: Option<String>,
    /// Human-readable size, e.g. `1.2 MB`
    pub size: Option<String>,
}

impl FileView {
    #[must_use]
    pub fn new(file: &File, media_base: &str) -> Self {
        Self {
            name: file.name.clone(),
            url: media_url(media_base, &file.url),
            caption: file.caption.clone().filter(|c| !c.is_empty()),
            size: file.size.map(format_kilobytes),
        }
    }
}

/// Call-to-action link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub href: String,
}

impl ButtonView {
    #[must_use]
    pub fn new(label: Option<&str>, link: Option<&str>) -> Option<Self> {
        let href = link.map(str::trim).filter(|l| !l.is_empty())?;
        Some(Self {
            label: label.unwrap_or(href).to_owned(),
            href: href.to_owned(),
        })
    }
}

fn format_kilobytes(kb: f64) -> String {
    if kb >= 1024.0 {
        format!("{:.1} MB", kb / 1024.0)
    } else {
        format!("{kb:.0} KB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url() {
        let base = "http://localhost:1337";
        assert_eq!(media_url(base, "/uploads/a.jpg"), "http://localhost:1337/uploads/a.jpg");
        assert_eq!(media_url(base, "uploads/a.jpg"), "http://localhost:1337/uploads/a.jpg");
        assert_eq!(media_url(base, "https://cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_button_requires_link() {
        assert_eq!(ButtonView::new(Some("Shop"), None), None);
        assert_eq!(
            ButtonView::new(None, Some("/products")),
            Some(ButtonView {
                label: "/products".to_string(),
                href: "/products".to_string()
            })
        );
    }

    #[test]
    fn test_format_kilobytes() {
        assert_eq!(format_kilobytes(12.4), "12 KB");
        assert_eq!(format_kilobytes(2048.0), "2.0 MB");
    }
}
