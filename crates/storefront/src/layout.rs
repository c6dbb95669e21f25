//! Shared page chrome: navigation, footer, cart badge, flashes, cookie banner
//! and third-party integrations.
//!
//! [`Layout`] is an extractor so every full-page handler gets the same data
//! without repeating the backend calls. Backend failures degrade to an empty
//! layout; they never fail the page.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use emporium_core::{
    CookieConfig, GlobalData, ImageSize, Integrations, NavigationGroup, ShopConfig,
};

use crate::cart::{SessionCartStore, ShopCart};
use crate::cookies::AcceptedCookies;
use crate::filters::render_optional_markdown;
use crate::models::Flash;
use crate::notifications::take_flashes;
use crate::state::AppState;
use crate::views::{ImageView, media_url};

/// Title used when a page has none.
pub const SITE_NAME: &str = "Emporium";

#[derive(Debug, Clone)]
pub struct NavLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct NavGroupView {
    pub title: Option<String>,
    pub links: Vec<NavLinkView>,
}

impl From<&NavigationGroup> for NavGroupView {
    fn from(group: &NavigationGroup) -> Self {
        Self {
            title: group.title.clone().filter(|t| !t.is_empty()),
            links: group
                .links
                .iter()
                .map(|link| NavLinkView {
                    label: link.label().to_owned(),
                    href: link.href(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieOptionView {
    pub value: String,
    pub label: String,
    pub info: Option<String>,
}

/// Consent banner, shown until the visitor makes a choice.
#[derive(Debug, Clone)]
pub struct CookieBannerView {
    /// Rendered Markdown
    pub message: String,
    pub settings_enabled: bool,
    pub options: Vec<CookieOptionView>,
}

impl CookieBannerView {
    fn new(config: &CookieConfig) -> Self {
        Self {
            message: render_optional_markdown(config.message.as_deref()),
            settings_enabled: config.settings_enabled,
            options: config
                .configuration
                .iter()
                .map(|option| CookieOptionView {
                    value: option.value.as_str().to_owned(),
                    label: option.label.clone(),
                    info: option.info.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsView {
    pub tracking_id: String,
    /// Track without cookies (visitor has not consented)
    pub anonymous: bool,
}

/// Everything `base.html` renders around the page content.
#[derive(Debug, Clone)]
pub struct Layout {
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub canonical_url: String,
    pub logo: Option<ImageView>,
    pub favicon_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub navigation: Vec<NavGroupView>,
    pub footer: Vec<NavGroupView>,
    pub copyright: Option<String>,
    pub cart_count: u64,
    pub flashes: Vec<Flash>,
    pub cookie_banner: Option<CookieBannerView>,
    pub analytics: Option<AnalyticsView>,
    pub chat_id: Option<String>,
    pub captcha_site_key: Option<String>,
}

impl Layout {
    /// Empty layout for `path`, used when nothing could be loaded.
    #[must_use]
    pub fn bare(base_url: &str, path: &str) -> Self {
        Self {
            title: SITE_NAME.to_owned(),
            description: None,
            keywords: None,
            canonical_url: format!("{base_url}{path}"),
            logo: None,
            favicon_url: None,
            preview_image_url: None,
            navigation: Vec::new(),
            footer: Vec::new(),
            copyright: None,
            cart_count: 0,
            flashes: Vec::new(),
            cookie_banner: None,
            analytics: None,
            chat_id: None,
            captcha_site_key: None,
        }
    }

    /// Page title followed by the site name.
    #[must_use]
    pub fn titled(mut self, title: Option<&str>) -> Self {
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.title = format!("{title} | {SITE_NAME}");
        }
        self
    }

    #[must_use]
    pub fn described(mut self, description: Option<&str>, keywords: Option<&str>) -> Self {
        self.description = description.map(str::to_owned).filter(|d| !d.is_empty());
        self.keywords = keywords.map(str::to_owned).filter(|k| !k.is_empty());
        self
    }

    /// Fill in site data from the backend's single types.
    fn apply_site(
        &mut self,
        media_base: &str,
        global: &GlobalData,
        integrations: &Integrations,
        cookies: &CookieConfig,
        accepted: Option<&AcceptedCookies>,
    ) {
        self.logo = ImageView::from_option(global.logo.as_ref(), ImageSize::Small, media_base);
        self.favicon_url = global
            .favicon
            .as_ref()
            .map(|image| media_url(media_base, image.url_for(ImageSize::Thumbnail)));
        self.preview_image_url = global
            .preview_image
            .as_ref()
            .map(|image| media_url(media_base, image.url_for(ImageSize::Large)));
        self.navigation = global.navigation.iter().map(NavGroupView::from).collect();
        self.footer = global.footer.iter().map(NavGroupView::from).collect();
        self.copyright = global.copyright.clone();

        self.cookie_banner =
            (cookies.enabled && accepted.is_none()).then(|| CookieBannerView::new(cookies));

        let consent = accepted.cloned().unwrap_or_default();
        self.analytics = integrations
            .analytics
            .as_ref()
            .filter(|a| a.enabled)
            .and_then(|a| {
                let tracking_id = a.tracking_id.clone().filter(|id| !id.is_empty())?;
                let allowed = consent.allows(a.cookie_value.as_deref().unwrap_or("all"));
                (allowed || a.anonymous_tracking).then_some(AnalyticsView {
                    tracking_id,
                    anonymous: !allowed,
                })
            });
        self.chat_id = integrations
            .chat
            .as_ref()
            .filter(|c| c.enabled && consent.allows(c.cookie_value.as_deref().unwrap_or("all")))
            .and_then(|c| c.tawk_to_id.clone());
        self.captcha_site_key = integrations.captcha_public_key().map(str::to_owned);
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut layout = Self::bare(&state.config().base_url, parts.uri.path());
        let accepted = AcceptedCookies::from_headers(&parts.headers);
        let backend = state.backend();

        let (global, integrations, cookies, shop) = tokio::join!(
            backend.global(),
            backend.integrations(),
            backend.cookies(),
            backend.shop(),
        );
        let global = global.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load global data");
            GlobalData::default()
        });
        let integrations = integrations.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load integrations");
            Integrations::default()
        });
        let cookies = cookies.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load cookie configuration");
            CookieConfig::default()
        });
        let shop = shop.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load shop configuration");
            ShopConfig::default()
        });

        layout.apply_site(
            &state.config().api_url,
            &global,
            &integrations,
            &cookies,
            accepted.as_ref(),
        );

        if let Ok(session) = Session::from_request_parts(parts, state).await {
            layout.flashes = take_flashes(&session).await;
            layout.cart_count = match ShopCart::load(SessionCartStore::new(session), shop).await {
                Ok(cart) => cart.total_quantity(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load cart for badge");
                    0
                }
            };
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use emporium_core::{AnalyticsIntegration, ChatIntegration, CookieLevel, CookieOption};

    use super::*;

    fn integrations(anonymous_tracking: bool) -> Integrations {
        Integrations {
            analytics: Some(AnalyticsIntegration {
                tracking_id: Some("G-TEST".to_string()),
                cookie_value: Some("all".to_string()),
                anonymous_tracking,
                enabled: true,
                ..AnalyticsIntegration::default()
            }),
            chat: Some(ChatIntegration {
                tawk_to_id: Some("chat-1".to_string()),
                cookie_value: Some("all".to_string()),
                enabled: true,
                ..ChatIntegration::default()
            }),
            ..Integrations::default()
        }
    }

    fn cookie_config() -> CookieConfig {
        CookieConfig {
            enabled: true,
            settings_enabled: true,
            message: Some("We use **cookies**.".to_string()),
            configuration: vec![CookieOption {
                value: CookieLevel::Essential,
                label: "Essential".to_string(),
                info: None,
            }],
            ..CookieConfig::default()
        }
    }

    #[test]
    fn test_banner_until_choice_is_made() {
        let mut layout = Layout::bare("http://shop.test", "/");
        layout.apply_site("", &GlobalData::default(), &Integrations::default(), &cookie_config(), None);
        let banner = layout.cookie_banner.as_ref().map(|b| b.message.clone());
        assert_eq!(banner.as_deref(), Some("<p>We use <strong>cookies</strong>.</p>\n"));

        let accepted = AcceptedCookies::accept_all();
        layout.apply_site(
            "",
            &GlobalData::default(),
            &Integrations::default(),
            &cookie_config(),
            Some(&accepted),
        );
        assert!(layout.cookie_banner.is_none());
    }

    #[test]
    fn test_integrations_follow_consent() {
        let mut layout = Layout::bare("http://shop.test", "/");
        layout.apply_site("", &GlobalData::default(), &integrations(false), &cookie_config(), None);
        assert!(layout.analytics.is_none());
        assert!(layout.chat_id.is_none());

        let accepted = AcceptedCookies::accept_all();
        layout.apply_site(
            "",
            &GlobalData::default(),
            &integrations(false),
            &cookie_config(),
            Some(&accepted),
        );
        assert_eq!(layout.chat_id.as_deref(), Some("chat-1"));
        assert!(layout.analytics.as_ref().is_some_and(|a| !a.anonymous));
    }

    #[test]
    fn test_anonymous_analytics_without_consent() {
        let mut layout = Layout::bare("http://shop.test", "/");
        layout.apply_site("", &GlobalData::default(), &integrations(true), &cookie_config(), None);
        assert!(layout.analytics.as_ref().is_some_and(|a| a.anonymous));
    }

    #[test]
    fn test_title() {
        let layout = Layout::bare("http://shop.test", "/about").titled(Some("About"));
        assert_eq!(layout.title, "About | Emporium");
        assert_eq!(layout.canonical_url, "http://shop.test/about");
        assert_eq!(Layout::bare("", "/").titled(Some("  ")).title, SITE_NAME);
    }
}
