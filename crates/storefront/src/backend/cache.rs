//! Cache types for the site-wide single types.

use emporium_core::{CookieConfig, GlobalData, Integrations, ShopConfig};

/// Cache key for single-type responses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Global,
    Integrations,
    Cookies,
    Shop,
}

impl CacheKey {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Integrations => "integrations",
            Self::Cookies => "cookies",
            Self::Shop => "shop",
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Global(Box<GlobalData>),
    Integrations(Box<Integrations>),
    Cookies(Box<CookieConfig>),
    Shop(Box<ShopConfig>),
}
