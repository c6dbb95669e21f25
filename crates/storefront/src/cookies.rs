//! Cookie consent and the visitor id cookie.
//!
//! The consent choice is stored client-side in `acceptedCookies` as
//! URL-encoded JSON, e.g. `{"essential":true,"all":false,"none":false}`.
//! Once anything beyond `none` is accepted the visitor also gets a random
//! 32-hex-character `sessionId` cookie. Both live for one year.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use emporium_core::random_hex;

pub const ACCEPTED_COOKIES: &str = "acceptedCookies";
pub const SESSION_ID: &str = "sessionId";

/// One year.
pub const MAX_AGE_SECONDS: i64 = 31_536_000;

const SESSION_ID_LEN: usize = 32;

/// Consent categories the visitor accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedCookies {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub none: bool,
    /// Per-category choices keyed by cookie option value (e.g. `essential`)
    #[serde(flatten)]
    pub categories: BTreeMap<String, bool>,
}

impl Default for AcceptedCookies {
    fn default() -> Self {
        Self {
            all: false,
            none: true,
            categories: BTreeMap::new(),
        }
    }
}

impl AcceptedCookies {
    /// Everything accepted.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            all: true,
            none: false,
            categories: BTreeMap::from([("essential".to_owned(), true)]),
        }
    }

    /// Essential cookies plus the explicitly selected categories.
    #[must_use]
    pub fn selected<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut accepted = Self {
            all: false,
            none: false,
            categories: BTreeMap::from([("essential".to_owned(), true)]),
        };
        for category in categories {
            match category {
                "all" => accepted.all = true,
                "none" => {}
                other => {
                    accepted.categories.insert(other.to_owned(), true);
                }
            }
        }
        accepted
    }

    /// Decode a raw (URL-encoded JSON) cookie value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    /// Read the consent cookie from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        cookie_value(headers, ACCEPTED_COOKIES).and_then(|raw| Self::parse(&raw))
    }

    /// Whether the visitor has made a choice other than declining everything.
    #[must_use]
    pub const fn has_consent(&self) -> bool {
        !self.none
    }

    /// Whether cookies tagged with `category` (an integration's `cookieValue`) may be set.
    #[must_use]
    pub fn allows(&self, category: &str) -> bool {
        if self.none {
            return false;
        }
        match category {
            "all" => self.all,
            "none" => true,
            other => self.all || self.categories.get(other).copied().unwrap_or(false),
        }
    }

    /// Cookie value: URL-encoded JSON.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned());
        urlencoding::encode(&json).into_owned()
    }

    /// `Set-Cookie` value storing this choice for a year.
    #[must_use]
    pub fn set_cookie(&self, secure: bool) -> String {
        long_lived_cookie(ACCEPTED_COOKIES, self.to_cookie_value(), secure)
    }
}

/// Existing visitor id, if the request carries a well-formed one.
#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_ID).filter(|id| {
        id.len() == SESSION_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Fresh visitor id and the `Set-Cookie` value that stores it.
#[must_use]
pub fn new_session_id_cookie(secure: bool) -> (String, String) {
    let id = random_hex(SESSION_ID_LEN);
    let header = long_lived_cookie(SESSION_ID, id.clone(), secure);
    (id, header)
}

fn long_lived_cookie(name: &'static str, value: String, secure: bool) -> String {
    Cookie::build((name, value))
        .path("/")
        .max_age(Duration::seconds(MAX_AGE_SECONDS))
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
        .to_string()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}
