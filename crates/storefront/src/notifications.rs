//! User-facing notifications.
//!
//! HTMX requests get an `HX-Trigger` response header carrying a `notify`
//! event; full page loads read one-shot flashes from the session instead.

use axum::http::{HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};
use tower_sessions::Session;

use crate::models::{Flash, FlashLevel, session_keys};

pub const HX_TRIGGER: &str = "hx-trigger";

/// Tells HTMX to skip swapping the response body.
pub const HX_RESWAP: &str = "hx-reswap";

/// HTMX event fired after any cart mutation.
pub const CART_UPDATED: &str = "cart-updated";

/// HTMX event carrying a notification payload.
pub const NOTIFY: &str = "notify";

impl Flash {
    #[must_use]
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

/// Queue a flash for the next full page render.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut pending = session
        .get::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(flash);

    if let Err(e) = session.insert(session_keys::FLASH, pending).await {
        tracing::error!("Failed to store flash message: {e}");
    }
}

/// Remove and return all queued flashes.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {e}");
            Vec::new()
        }
    }
}

/// Builder for the `HX-Trigger` header value.
#[derive(Debug, Default, Clone)]
pub struct HxTrigger {
    events: Map<String, Value>,
}

impl HxTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn event(mut self, name: &str) -> Self {
        self.events.insert(name.to_owned(), Value::Null);
        self
    }

    #[must_use]
    pub fn notify(mut self, flash: &Flash) -> Self {
        self.events.insert(
            NOTIFY.to_owned(),
            json!({ "level": flash.level.as_str(), "message": flash.message }),
        );
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Header value, `None` when no event was added.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        if self.events.is_empty() {
            return None;
        }
        let json = Value::Object(self.events.clone()).to_string();
        HeaderValue::from_str(&json).ok()
    }

    /// Response headers carrying the trigger; empty when no event was added.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.header_value() {
            headers.insert(HX_TRIGGER, value);
        }
        headers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_combines_events() {
        let value = HxTrigger::new()
            .event(CART_UPDATED)
            .notify(&Flash::warning("Maximum quantity reached"))
            .header_value()
            .unwrap();
        let parsed: Value = serde_json::from_str(value.to_str().unwrap()).unwrap();
        assert!(parsed[CART_UPDATED].is_null());
        assert_eq!(parsed[NOTIFY]["level"], "warning");
        assert_eq!(parsed[NOTIFY]["message"], "Maximum quantity reached");
    }

    #[test]
    fn test_empty_trigger_has_no_header() {
        assert!(HxTrigger::new().header_value().is_none());
        assert!(HxTrigger::new().headers().is_empty());
        assert!(HxTrigger::new().event(CART_UPDATED).headers().contains_key(HX_TRIGGER));
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
