//! Tagged content sections that compose a CMS page.
//!
//! The CMS tags every section with a `__component` discriminator such as
//! `section.hero`. [`Section`] is the closed set of tags the storefront knows
//! how to render. Anything else, including a known tag whose payload does not
//! match its shape, becomes [`Section::Unknown`] and renders as nothing.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{File, Image};
use crate::types::SectionId;

/// Call-to-action button attached to hero, banner and text sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub button: Option<Button>,
    #[serde(default)]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardVariant {
    #[default]
    #[serde(rename = "standart", alias = "standard")]
    Standard,
    #[serde(rename = "person")]
    Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub variant: CardVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub button: Option<Button>,
    #[serde(default)]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextWithImageSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub button: Option<Button>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GallerySection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsSection {
    pub id: SectionId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub files: Vec<File>,
}

/// A page section, discriminated by the CMS `__component` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__component")]
pub enum Section {
    #[serde(rename = "section.hero")]
    Hero(HeroSection),
    #[serde(rename = "section.cards")]
    Cards(CardsSection),
    #[serde(rename = "section.banner")]
    Banner(BannerSection),
    #[serde(rename = "section.text")]
    Text(TextSection),
    #[serde(rename = "section.text-with-image")]
    TextWithImage(TextWithImageSection),
    #[serde(rename = "section.quote")]
    Quote(QuoteSection),
    #[serde(rename = "section.contact")]
    Contact(ContactSection),
    #[serde(rename = "section.gallery")]
    Gallery(GallerySection),
    #[serde(rename = "section.location")]
    Location(LocationSection),
    #[serde(rename = "section.documents")]
    Documents(DocumentsSection),
    /// Unrecognized tag or malformed payload; renders as nothing.
    #[serde(other)]
    Unknown,
}

impl Section {
    /// Short kind name used in render keys, `None` for [`Section::Unknown`].
    #[must_use]
    pub const fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Hero(_) => Some("hero"),
            Self::Cards(_) => Some("cards"),
            Self::Banner(_) => Some("banner"),
            Self::Text(_) => Some("text"),
            Self::TextWithImage(_) => Some("text-with-image"),
            Self::Quote(_) => Some("quote"),
            Self::Contact(_) => Some("contact"),
            Self::Gallery(_) => Some("gallery"),
            Self::Location(_) => Some("location"),
            Self::Documents(_) => Some("documents"),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<SectionId> {
        match self {
            Self::Hero(s) => Some(s.id),
            Self::Cards(s) => Some(s.id),
            Self::Banner(s) => Some(s.id),
            Self::Text(s) => Some(s.id),
            Self::TextWithImage(s) => Some(s.id),
            Self::Quote(s) => Some(s.id),
            Self::Contact(s) => Some(s.id),
            Self::Gallery(s) => Some(s.id),
            Self::Location(s) => Some(s.id),
            Self::Documents(s) => Some(s.id),
            Self::Unknown => None,
        }
    }

    /// Stable render key `"{kind}-{id}"`.
    ///
    /// Section ids are only unique per component table, so the kind is part
    /// of the key.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        Some(format!("{}-{}", self.kind()?, self.id()?))
    }

    /// Decode one raw section, degrading malformed payloads to [`Section::Unknown`].
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        let tag = value
            .get("__component")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<untagged>")
            .to_owned();
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(component = %tag, error = %e, "Malformed page section skipped");
            Self::Unknown
        })
    }
}

/// Deserialize a section list, degrading malformed entries to [`Section::Unknown`].
///
/// # Errors
///
/// Fails only when the value is not a JSON array (or null).
pub fn deserialize_sections<'de, D>(deserializer: D) -> Result<Vec<Section>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Section::from_value)
        .collect())
}
