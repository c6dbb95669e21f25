//! Storefront-side models.
//!
//! Content models come from `emporium_core`; this module only holds what the
//! storefront keeps in the visitor's session.

pub mod session;

pub use session::keys as session_keys;
pub use session::{Flash, FlashLevel};
