//! Uploaded media references (images and downloadable files).

use serde::{Deserialize, Serialize};

use crate::types::MediaId;

/// Rendition sizes the media library generates for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Thumbnail,
    Small,
    Medium,
    Large,
    Original,
}

/// A single generated rendition of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormats {
    #[serde(default)]
    pub thumbnail: Option<ImageFormat>,
    #[serde(default)]
    pub small: Option<ImageFormat>,
    #[serde(default)]
    pub medium: Option<ImageFormat>,
    #[serde(default)]
    pub large: Option<ImageFormat>,
}

/// An uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub id: Option<MediaId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alternative_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub formats: Option<ImageFormats>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl Image {
    /// Alternative text, falling back to the caption and then the file name.
    #[must_use]
    pub fn alt(&self) -> &str {
        self.alternative_text
            .as_deref()
            .or(self.caption.as_deref())
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// URL of the requested rendition, or the closest larger one that exists.
    #[must_use]
    pub fn url_for(&self, size: ImageSize) -> &str {
        let Some(formats) = &self.formats else {
            return &self.url;
        };

        let candidates = match size {
            ImageSize::Thumbnail => [&formats.thumbnail, &formats.small, &formats.medium, &formats.large],
            ImageSize::Small => [&formats.small, &formats.medium, &formats.large, &None],
            ImageSize::Medium => [&formats.medium, &formats.large, &None, &None],
            ImageSize::Large => [&formats.large, &None, &None, &None],
            ImageSize::Original => [&None, &None, &None, &None],
        };

        candidates
            .into_iter()
            .flatten()
            .map(|format| format.url.as_str())
            .next()
            .unwrap_or(&self.url)
    }
}

/// A downloadable file (product documents, document sections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default)]
    pub id: Option<MediaId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    /// Size in kilobytes.
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image_with_formats() -> Image {
        serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "shoe.jpg",
            "alternativeText": "",
            "url": "/uploads/shoe.jpg",
            "formats": {
                "thumbnail": { "url": "/uploads/thumbnail_shoe.jpg", "width": 156 },
                "medium": { "url": "/uploads/medium_shoe.jpg", "width": 750 }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_url_for_falls_back_to_larger_rendition() {
        let image = image_with_formats();
        assert_eq!(image.url_for(ImageSize::Thumbnail), "/uploads/thumbnail_shoe.jpg");
        assert_eq!(image.url_for(ImageSize::Small), "/uploads/medium_shoe.jpg");
        assert_eq!(image.url_for(ImageSize::Large), "/uploads/shoe.jpg");
        assert_eq!(image.url_for(ImageSize::Original), "/uploads/shoe.jpg");
    }

    #[test]
    fn test_alt_prefers_alternative_text() {
        let mut image = image_with_formats();
        assert_eq!(image.alt(), "");
        image.alternative_text = None;
        assert_eq!(image.alt(), "shoe.jpg");
        image.alternative_text = Some("Red shoe".to_string());
        assert_eq!(image.alt(), "Red shoe");
    }
}
