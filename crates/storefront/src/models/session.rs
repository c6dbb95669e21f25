//! Session-related types.

use serde::{Deserialize, Serialize};

/// Severity of a flash notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One-shot notification shown on the next full page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Session keys.
pub mod keys {
    /// JSON text of the cart line array.
    pub const CART: &str = "cart";

    /// Selected shipping destination (country code).
    pub const SHIPPING_COUNTRY: &str = "shipping_country";

    /// Pending flash notifications.
    pub const FLASH: &str = "flash";
}
