//! Site-wide single types: global layout data, integrations and cookie consent.

use serde::{Deserialize, Serialize};

use super::media::Image;

/// A single navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationLink {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NavigationLink {
    /// Target of the link: `path` is site-relative, `link` is the label.
    #[must_use]
    pub fn href(&self) -> String {
        match self.path.as_deref() {
            Some(path) if path.starts_with("http") || path.starts_with('/') => path.to_owned(),
            Some(path) => format!("/{path}"),
            None => "/".to_owned(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }
}

/// A titled group of links in the header or footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationGroup {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub links: Vec<NavigationLink>,
}

/// The `global` single type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalData {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub logo: Option<Image>,
    #[serde(default)]
    pub favicon: Option<Image>,
    #[serde(default)]
    pub preview_image: Option<Image>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub navigation: Vec<NavigationGroup>,
    #[serde(default)]
    pub footer: Vec<NavigationGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsIntegration {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, rename = "GATrackingID")]
    pub tracking_id: Option<String>,
    /// Cookie category that must be accepted before tracking loads.
    #[serde(default)]
    pub cookie_value: Option<String>,
    #[serde(default)]
    pub anonymous_tracking: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatIntegration {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, rename = "TawkToID")]
    pub tawk_to_id: Option<String>,
    #[serde(default)]
    pub cookie_value: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecaptchaIntegration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub public_key: Option<String>,
    /// Server-side verification secret. Never served to clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationIntegration {
    #[serde(default, rename = "MessageReceived")]
    pub message_received: bool,
    #[serde(default, rename = "OrderReceived")]
    pub order_received: bool,
    #[serde(default, rename = "NotifiedEmail")]
    pub notified_email: Option<String>,
}

/// The `integrations` single type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Integrations {
    #[serde(default, rename = "Analytics", skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsIntegration>,
    #[serde(default, rename = "Chat", skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatIntegration>,
    #[serde(default, rename = "ReCaptcha", skip_serializing_if = "Option::is_none")]
    pub recaptcha: Option<RecaptchaIntegration>,
    #[serde(default, rename = "Notification", skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationIntegration>,
}

impl Integrations {
    /// Copy that is safe to serve publicly: no captcha secret, no notification settings.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut public = self.clone();
        if let Some(recaptcha) = public.recaptcha.as_mut() {
            recaptcha.secret = None;
        }
        public.notification = None;
        public
    }

    #[must_use]
    pub fn captcha_enabled(&self) -> bool {
        self.recaptcha.as_ref().is_some_and(|r| r.enabled)
    }

    #[must_use]
    pub fn captcha_public_key(&self) -> Option<&str> {
        self.recaptcha
            .as_ref()
            .filter(|r| r.enabled)
            .and_then(|r| r.public_key.as_deref())
    }

    #[must_use]
    pub fn captcha_secret(&self) -> Option<&str> {
        self.recaptcha.as_ref().and_then(|r| r.secret.as_deref())
    }
}

/// Consent level a cookie option grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieLevel {
    None,
    Essential,
    All,
}

impl CookieLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Essential => "essential",
            Self::All => "all",
        }
    }
}

/// One choice offered by the cookie banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieOption {
    pub value: CookieLevel,
    #[serde(rename = "type", default)]
    pub label: String,
    #[serde(default)]
    pub info: Option<String>,
}

/// The `cookies` single type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieConfig {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub settings_enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub configuration: Vec<CookieOption>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_integrations_sanitized_drops_secrets() {
        let integrations: Integrations = serde_json::from_value(serde_json::json!({
            "Analytics": { "GATrackingID": "UA-1", "enabled": true },
            "ReCaptcha": { "enabled": true, "publicKey": "pk", "secret": "sk" },
            "Notification": { "MessageReceived": true, "NotifiedEmail": "owner@shop.de" }
        }))
        .unwrap();
        assert!(integrations.captcha_enabled());
        assert_eq!(integrations.captcha_secret(), Some("sk"));

        let public = serde_json::to_value(integrations.sanitized()).unwrap();
        assert_eq!(public["ReCaptcha"]["publicKey"], "pk");
        assert!(public["ReCaptcha"].get("secret").is_none());
        assert!(public.get("Notification").is_none());
        assert_eq!(public["Analytics"]["GATrackingID"], "UA-1");
    }

    #[test]
    fn test_captcha_disabled_by_default() {
        let integrations = Integrations::default();
        assert!(!integrations.captcha_enabled());
        assert_eq!(integrations.captcha_public_key(), None);
    }

    #[test]
    fn test_cookie_config_parses_options() {
        let config: CookieConfig = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "settingsEnabled": true,
            "configuration": [
                { "value": "essential", "type": "Essential", "info": "Session" },
                { "value": "all", "type": "Statistics", "info": "Analytics" }
            ]
        }))
        .unwrap();
        assert_eq!(config.configuration.len(), 2);
        assert_eq!(config.configuration[1].value, CookieLevel::All);
        assert_eq!(config.configuration[0].label, "Essential");
    }

    #[test]
    fn test_navigation_href() {
        let link = NavigationLink {
            id: None,
            link: Some("Shop".to_string()),
            path: Some("products".to_string()),
            image_url: None,
        };
        assert_eq!(link.href(), "/products");
        assert_eq!(link.label(), "Shop");
    }
}
