//! Content models served by the backend and consumed by the storefront.
//!
//! Field names follow the CMS JSON shape (`camelCase`), with `snake_case`
//! timestamps.

pub mod media;
pub mod order;
pub mod page;
pub mod post;
pub mod product;
pub mod shop;
pub mod site;

pub use media::{File, Image, ImageFormat, ImageFormats, ImageSize};
pub use order::{Message, Order, OrderItem, ProductRef, ValidationError};
pub use page::Page;
pub use post::{Author, Post};
pub use product::Product;
pub use shop::{DEFAULT_MAX_QUANTITY, DEFAULT_SHIPPING_COUNTRY, ShippingTier, ShopConfig};
pub use site::{
    AnalyticsIntegration, ChatIntegration, CookieConfig, CookieLevel, CookieOption, GlobalData,
    Integrations, NavigationGroup, NavigationLink, NotificationIntegration, RecaptchaIntegration,
};
