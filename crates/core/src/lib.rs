//! Emporium Core - shared domain types.
//!
//! This crate provides the types shared by all Emporium components:
//! - `backend` - JSON content API over `PostgreSQL`
//! - `storefront` - Server-rendered shop
//! - `cli` - Migrations, seeding and exports
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no database access and
//! no HTTP clients. The cart line-item collection, shipping-tier lookup and
//! slug derivation live here so both services compute them the same way.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices and emails
//! - [`models`] - Content models served by the backend
//! - [`section`] - Tagged page sections
//! - [`cart`] - Cart line items and their persisted form
//! - [`query`] - Listing query parameters
//! - [`slug`] - Identifier and reading-time derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod models;
pub mod query;
pub mod section;
pub mod slug;
pub mod types;

pub use cart::{Cart, CartBlobError, CartItem, CartLineId};
pub use models::*;
pub use query::{ListQuery, PostQuery, ProductQuery, Sort, SortDirection};
pub use section::Section;
pub use types::*;
