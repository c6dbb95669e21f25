//! Page section rendering.
//!
//! Every known [`Section`] variant maps to its own Askama template under
//! `templates/sections/`. Output keeps the input order, [`Section::Unknown`]
//! renders as nothing, and each rendered block carries the stable key
//! `"{kind}-{id}"` as its element id.

use askama::Template;

use emporium_core::section::{
    Align, BannerSection, CardVariant, CardsSection, ContactSection, DocumentsSection,
    GallerySection, HeroSection, LocationSection, QuoteSection, TextSection, TextWithImageSection,
};
use emporium_core::{ImageSize, Section};

use crate::filters::render_optional_markdown;
use crate::views::{ButtonView, FileView, ImageView};

/// Request-level data a section may need.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Origin that relative upload URLs resolve against
    pub media_base: &'a str,
    /// Public captcha key for forms, when captcha is enabled
    pub captcha_site_key: Option<&'a str>,
}

/// One section rendered to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub key: String,
    pub html: String,
}

/// Render `sections` in order, skipping unknown or unrenderable ones.
#[must_use]
pub fn render_sections(sections: &[Section], ctx: &RenderContext<'_>) -> Vec<RenderedSection> {
    sections
        .iter()
        .filter_map(|section| render_section(section, ctx))
        .collect()
}

/// Render a single section; `None` for [`Section::Unknown`] or a template failure.
#[must_use]
pub fn render_section(section: &Section, ctx: &RenderContext<'_>) -> Option<RenderedSection> {
    let key = section.key()?;

    let rendered = match section {
        Section::Hero(s) => HeroTemplate::new(&key, s, ctx).render(),
        Section::Cards(s) => CardsTemplate::new(&key, s, ctx).render(),
        Section::Banner(s) => BannerTemplate::new(&key, s, ctx).render(),
        Section::Text(s) => TextTemplate::new(&key, s).render(),
        Section::TextWithImage(s) => TextWithImageTemplate::new(&key, s, ctx).render(),
        Section::Quote(s) => QuoteTemplate::new(&key, s, ctx).render(),
        Section::Contact(s) => ContactTemplate::new(&key, s, ctx).render(),
        Section::Gallery(s) => GalleryTemplate::new(&key, s, ctx).render(),
        Section::Location(s) => LocationTemplate::new(&key, s).render(),
        Section::Documents(s) => DocumentsTemplate::new(&key, s, ctx).render(),
        Section::Unknown => return None,
    };

    match rendered {
        Ok(html) => Some(RenderedSection { key, html }),
        Err(e) => {
            tracing::error!(section = %key, error = %e, "Failed to render section");
            None
        }
    }
}

fn anchor(identifier: Option<&String>) -> Option<String> {
    identifier
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "sections/hero.html")]
struct HeroTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    content: String,
    button: Option<ButtonView>,
    image: Option<ImageView>,
}

impl<'a> HeroTemplate<'a> {
    fn new(key: &'a str, s: &HeroSection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            content: render_optional_markdown(s.content.as_deref()),
            button: s
                .button
                .as_ref()
                .and_then(|b| ButtonView::new(b.content.as_deref(), b.link.as_deref())),
            image: ImageView::from_option(s.image.as_ref(), ImageSize::Large, ctx.media_base),
        }
    }
}

struct CardView {
    headline: Option<String>,
    content: String,
    image: Option<ImageView>,
    link: Option<ButtonView>,
    person: bool,
}

#[derive(Template)]
#[template(path = "sections/cards.html")]
struct CardsTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    headline: Option<String>,
    cards: Vec<CardView>,
}

impl<'a> CardsTemplate<'a> {
    fn new(key: &'a str, s: &CardsSection, ctx: &RenderContext<'_>) -> Self {
        let cards = s
            .cards
            .iter()
            .map(|card| CardView {
                headline: card.headline.clone(),
                content: render_optional_markdown(card.content.as_deref()),
                image: ImageView::from_option(card.image.as_ref(), ImageSize::Small, ctx.media_base),
                link: ButtonView::new(card.link_text.as_deref(), card.link.as_deref()),
                person: card.variant == CardVariant::Person,
            })
            .collect();

        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            headline: s.headline.clone(),
            cards,
        }
    }
}

#[derive(Template)]
#[template(path = "sections/banner.html")]
struct BannerTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    content: String,
    button: Option<ButtonView>,
    image: Option<ImageView>,
}

impl<'a> BannerTemplate<'a> {
    fn new(key: &'a str, s: &BannerSection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            content: render_optional_markdown(s.content.as_deref()),
            button: s
                .button
                .as_ref()
                .and_then(|b| ButtonView::new(b.content.as_deref(), b.link.as_deref())),
            image: ImageView::from_option(s.image.as_ref(), ImageSize::Large, ctx.media_base),
        }
    }
}

#[derive(Template)]
#[template(path = "sections/text.html")]
struct TextTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    content: String,
}

impl<'a> TextTemplate<'a> {
    fn new(key: &'a str, s: &TextSection) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            content: render_optional_markdown(s.content.as_deref()),
        }
    }
}

#[derive(Template)]
#[template(path = "sections/text_with_image.html")]
struct TextWithImageTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    content: String,
    button: Option<ButtonView>,
    image: Option<ImageView>,
    image_right: bool,
}

impl<'a> TextWithImageTemplate<'a> {
    fn new(key: &'a str, s: &TextWithImageSection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            content: render_optional_markdown(s.content.as_deref()),
            button: s
                .button
                .as_ref()
                .and_then(|b| ButtonView::new(b.content.as_deref(), b.link.as_deref())),
            image: ImageView::from_option(s.image.as_ref(), ImageSize::Medium, ctx.media_base),
            image_right: s.align == Align::Right,
        }
    }
}

#[derive(Template)]
#[template(path = "sections/quote.html")]
struct QuoteTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    content: String,
    author: Option<String>,
    company: Option<String>,
    image: Option<ImageView>,
}

impl<'a> QuoteTemplate<'a> {
    fn new(key: &'a str, s: &QuoteSection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            content: render_optional_markdown(s.content.as_deref()),
            author: s.author.clone(),
            company: s.company.clone(),
            image: ImageView::from_option(s.image.as_ref(), ImageSize::Thumbnail, ctx.media_base),
        }
    }
}

#[derive(Template)]
#[template(path = "sections/contact.html")]
struct ContactTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    headline: Option<String>,
    captcha_site_key: Option<&'a str>,
}

impl<'a> ContactTemplate<'a> {
    fn new(key: &'a str, s: &ContactSection, ctx: &RenderContext<'a>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            headline: s.headline.clone(),
            captcha_site_key: ctx.captcha_site_key,
        }
    }
}

#[derive(Template)]
#[template(path = "sections/gallery.html")]
struct GalleryTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    headline: Option<String>,
    images: Vec<ImageView>,
}

impl<'a> GalleryTemplate<'a> {
    fn new(key: &'a str, s: &GallerySection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            headline: s.headline.clone(),
            images: s
                .images
                .iter()
                .map(|image| ImageView::new(image, ImageSize::Medium, ctx.media_base))
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "sections/location.html")]
struct LocationTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    headline: Option<String>,
    name: Option<String>,
    lines: Vec<String>,
    map_url: Option<String>,
}

impl<'a> LocationTemplate<'a> {
    fn new(key: &'a str, s: &LocationSection) -> Self {
        let join = |parts: [Option<&String>; 2]| {
            let line = parts
                .into_iter()
                .flatten()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!line.is_empty()).then_some(line)
        };
        let lines: Vec<String> = [
            join([s.street.as_ref(), s.house.as_ref()]),
            join([s.code.as_ref(), s.city.as_ref()]),
        ]
        .into_iter()
        .flatten()
        .collect();

        let map_url = (!lines.is_empty()).then(|| {
            format!(
                "https://www.google.com/maps/search/?api=1&query={}",
                urlencoding::encode(&lines.join(", "))
            )
        });

        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            headline: s.headline.clone(),
            name: s.name.clone(),
            lines,
            map_url,
        }
    }
}

#[derive(Template)]
#[template(path = "sections/documents.html")]
struct DocumentsTemplate<'a> {
    key: &'a str,
    anchor: Option<String>,
    headline: Option<String>,
    files: Vec<FileView>,
}

impl<'a> DocumentsTemplate<'a> {
    fn new(key: &'a str, s: &DocumentsSection, ctx: &RenderContext<'_>) -> Self {
        Self {
            key,
            anchor: anchor(s.identifier.as_ref()),
            headline: s.headline.clone(),
            files: s
                .files
                .iter()
                .map(|file| FileView::new(file, ctx.media_base))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::Page;

    use super::*;

    const CTX: RenderContext<'static> = RenderContext {
        media_base: "http://cms.test",
        captcha_site_key: Some("site-key"),
    };

    fn page(content: serde_json::Value) -> Page {
        serde_json::from_value(serde_json::json!({ "id": 1, "path": "index", "content": content }))
            .unwrap()
    }

    #[test]
    fn test_order_preserved_and_unknown_skipped() {
        let page = page(serde_json::json!([
            { "__component": "section.text", "id": 2, "content": "first" },
            { "__component": "section.countdown", "id": 5 },
            { "__component": "section.hero", "id": 2, "content": "# Big" },
            { "__component": "section.quote", "id": 9, "content": "Nice", "author": "Ada" }
        ]));

        let rendered = render_sections(&page.content, &CTX);
        let keys: Vec<&str> = rendered.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["text-2", "hero-2", "quote-9"]);
        assert!(rendered[0].html.contains("<p>first</p>"));
        assert!(rendered[1].html.contains("<h1>Big</h1>"));
        assert!(rendered[2].html.contains("Ada"));
    }

    #[test]
    fn test_section_element_carries_key() {
        let page = page(serde_json::json!([
            { "__component": "section.text-with-image", "id": 7, "align": "right",
              "image": { "url": "/uploads/a.jpg", "alternativeText": "A" } }
        ]));
        let rendered = render_sections(&page.content, &CTX);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].html.contains(r#"data-section="text-with-image-7""#));
        assert!(rendered[0].html.contains("http://cms.test/uploads/a.jpg"));
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        let page = page(serde_json::json!([
            { "__component": "section.text", "id": 1, "content": "<script>x()</script>" }
        ]));
        let rendered = render_sections(&page.content, &CTX);
        assert!(!rendered[0].html.contains("<script>"));
    }

    #[test]
    fn test_contact_form_includes_captcha_key() {
        let page = page(serde_json::json!([
            { "__component": "section.contact", "id": 3, "headline": "Write us" }
        ]));
        let rendered = render_sections(&page.content, &CTX);
        assert!(rendered[0].html.contains(r#"action="/contact""#));
        assert!(rendered[0].html.contains("site-key"));
    }

    #[test]
    fn test_location_builds_map_link() {
        let section = LocationSection {
            id: emporium_core::SectionId::new(1),
            identifier: None,
            headline: None,
            name: Some("Shop".to_string()),
            street: Some("Main St".to_string()),
            house: Some("5".to_string()),
            code: Some("10115".to_string()),
            city: Some("Berlin".to_string()),
        };
        let template = LocationTemplate::new("location-1", &section);
        assert_eq!(template.lines, ["Main St 5", "10115 Berlin"]);
        assert!(template.map_url.unwrap().contains("Main%20St%205%2C%2010115%20Berlin"));
    }
}
