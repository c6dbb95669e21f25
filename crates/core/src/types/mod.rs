//! Core value types shared across the workspace.

pub mod email;
pub mod id;
pub mod price;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Currency, Price};
pub use token::random_hex;
