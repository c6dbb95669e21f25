//! Per-visitor cart and shipping destination.
//!
//! [`ShopCart`] wraps the pure [`Cart`] from `emporium_core` with the shop
//! configuration and a [`CartStore`]. It is built per request: `load` reads
//! the persisted blob once, every successful mutation writes it back, and a
//! refused or no-op mutation writes nothing.
//!
//! Requests on the same session are not serialized; the last write wins.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use thiserror::Error;
use tower_sessions::Session;

use emporium_core::{Cart, CartBlobError, CartItem, OrderItem, Price, Product, ShopConfig};

use crate::models::session_keys;

/// Errors from reading or writing persisted cart state.
#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("cart encoding error: {0}")]
    Blob(#[from] CartBlobError),
}

/// Where a visitor's cart blob and shipping country live between requests.
pub trait CartStore: Send + Sync {
    fn load_cart(&self) -> impl Future<Output = Result<Option<String>, CartStoreError>> + Send;

    fn save_cart(&self, blob: String) -> impl Future<Output = Result<(), CartStoreError>> + Send;

    fn load_shipping_country(
        &self,
    ) -> impl Future<Output = Result<Option<String>, CartStoreError>> + Send;

    fn save_shipping_country(
        &self,
        country: String,
    ) -> impl Future<Output = Result<(), CartStoreError>> + Send;
}

// =============================================================================
// Stores
// =============================================================================

/// Cart state kept in the visitor's tower-sessions session.
#[derive(Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStore for SessionCartStore {
    async fn load_cart(&self) -> Result<Option<String>, CartStoreError> {
        Ok(self.session.get::<String>(session_keys::CART).await?)
    }

    async fn save_cart(&self, blob: String) -> Result<(), CartStoreError> {
        Ok(self.session.insert(session_keys::CART, blob).await?)
    }

    async fn load_shipping_country(&self) -> Result<Option<String>, CartStoreError> {
        Ok(self
            .session
            .get::<String>(session_keys::SHIPPING_COUNTRY)
            .await?)
    }

    async fn save_shipping_country(&self, country: String) -> Result<(), CartStoreError> {
        Ok(self
            .session
            .insert(session_keys::SHIPPING_COUNTRY, country)
            .await?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    cart: Option<String>,
    shipping_country: Option<String>,
    writes: usize,
}

/// In-process store; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCartStore {
    /// Store pre-seeded with a raw cart blob.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        let store = Self::default();
        store.lock().cart = Some(blob.into());
        store
    }

    /// Current raw cart blob.
    #[must_use]
    pub fn blob(&self) -> Option<String> {
        self.lock().cart.clone()
    }

    /// Number of writes performed so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore for MemoryCartStore {
    async fn load_cart(&self) -> Result<Option<String>, CartStoreError> {
        Ok(self.lock().cart.clone())
    }

    async fn save_cart(&self, blob: String) -> Result<(), CartStoreError> {
        let mut state = self.lock();
        state.cart = Some(blob);
        state.writes += 1;
        Ok(())
    }

    async fn load_shipping_country(&self) -> Result<Option<String>, CartStoreError> {
        Ok(self.lock().shipping_country.clone())
    }

    async fn save_shipping_country(&self, country: String) -> Result<(), CartStoreError> {
        let mut state = self.lock();
        state.shipping_country = Some(country);
        state.writes += 1;
        Ok(())
    }
}

// =============================================================================
// ShopCart
// =============================================================================

/// A visitor's cart bound to the shop configuration and its store.
pub struct ShopCart<S> {
    store: S,
    shop: ShopConfig,
    cart: Cart,
    shipping_country: String,
}

impl<S: CartStore> ShopCart<S> {
    /// Read the persisted cart and shipping country from `store`.
    ///
    /// A corrupt blob yields an empty cart. A missing country falls back to
    /// the shop's first shipping country.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the store cannot be read.
    pub async fn load(store: S, shop: ShopConfig) -> Result<Self, CartStoreError> {
        let blob = store.load_cart().await?;
        let cart = Cart::from_blob(blob.as_deref(), shop.max_quantity());

        let shipping_country = store
            .load_shipping_country()
            .await?
            .map(|country| country.trim().to_ascii_uppercase())
            .filter(|country| !country.is_empty())
            .unwrap_or_else(|| shop.default_shipping_country().to_owned());

        Ok(Self {
            store,
            shop,
            cart,
            shipping_country,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub const fn shop(&self) -> &ShopConfig {
        &self.shop
    }

    #[must_use]
    pub fn max_quantity(&self) -> u32 {
        self.cart.max_quantity()
    }

    /// Add one unit of `product`; `false` when its line is already at the limit.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the updated cart cannot be persisted.
    pub async fn add_to_cart(&mut self, product: &Product) -> Result<bool, CartStoreError> {
        if !self.cart.add(product) {
            tracing::debug!(product_id = %product.id, "Quantity limit reached");
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Set a line's quantity; `false` for an unknown line or a quantity above the limit.
    ///
    /// A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the updated cart cannot be persisted.
    pub async fn set_quantity(&mut self, line_id: &str, quantity: i64) -> Result<bool, CartStoreError> {
        if !self.cart.set_quantity(line_id, quantity) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Remove a line; unknown ids are ignored without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the updated cart cannot be persisted.
    pub async fn remove_from_cart(&mut self, line_id: &str) -> Result<bool, CartStoreError> {
        if !self.cart.remove(line_id) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Empty the cart (after a successful checkout).
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the empty cart cannot be persisted.
    pub async fn clear(&mut self) -> Result<(), CartStoreError> {
        self.cart.clear();
        self.persist().await
    }

    #[must_use]
    pub fn shipping_country(&self) -> &str {
        &self.shipping_country
    }

    /// Change the shipping destination and remember it for later requests.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the country cannot be persisted.
    pub async fn set_shipping_country(&mut self, country: &str) -> Result<(), CartStoreError> {
        let country = country.trim().to_ascii_uppercase();
        if country.is_empty() || country == self.shipping_country {
            return Ok(());
        }
        self.shipping_country.clone_from(&country);
        self.store.save_shipping_country(country).await
    }

    #[must_use]
    pub fn available_shipping_countries(&self) -> Vec<&str> {
        self.shop.available_shipping_countries()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// Shipping for the selected country; zero when no tier covers it.
    #[must_use]
    pub fn shipping_price(&self) -> Decimal {
        self.shop.shipping_price(&self.shipping_country)
    }

    /// Items plus shipping, in the shop's currency.
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.shop.price(self.total_price() + self.shipping_price())
    }

    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.cart.order_items()
    }

    async fn persist(&self) -> Result<(), CartStoreError> {
        let blob = self.cart.to_blob()?;
        self.store.save_cart(blob).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{ProductId, ShippingTier};

    use super::*;

    fn product(id: i32, price: i64) -> Product {
        Product::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
    }

    fn shop() -> ShopConfig {
        ShopConfig {
            shipping: vec![
                ShippingTier {
                    id: None,
                    countries: vec!["DE".to_string(), "AT".to_string()],
                    price: Decimal::from(5),
                },
                ShippingTier {
                    id: None,
                    countries: vec!["US".to_string()],
                    price: Decimal::from(20),
                },
            ],
            ..ShopConfig::default()
        }
    }

    async fn load(store: &MemoryCartStore) -> ShopCart<MemoryCartStore> {
        ShopCart::load(store.clone(), shop()).await.unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        let p1 = product(1, 10);

        assert!(cart.add_to_cart(&p1).await.unwrap());
        assert!(cart.add_to_cart(&p1).await.unwrap());
        let line_id = cart.items()[0].id.to_string();
        assert!(cart.set_quantity(&line_id, 3).await.unwrap());
        assert!(!cart.remove_from_cart("other-line").await.unwrap());

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_price(), Decimal::from(30));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[tokio::test]
    async fn test_mutations_persist_and_reload() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        cart.add_to_cart(&product(1, 10)).await.unwrap();
        cart.add_to_cart(&product(2, 4)).await.unwrap();

        let reloaded = load(&store).await;
        assert_eq!(reloaded.cart(), cart.cart());
        assert_eq!(reloaded.total_price(), Decimal::from(14));
    }

    #[tokio::test]
    async fn test_refused_and_noop_mutations_do_not_write() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        let p1 = product(1, 10);
        cart.add_to_cart(&p1).await.unwrap();
        let line_id = cart.items()[0].id.to_string();
        assert_eq!(store.writes(), 1);

        assert!(cart.set_quantity(&line_id, 10).await.unwrap());
        assert!(!cart.add_to_cart(&p1).await.unwrap());
        assert!(!cart.set_quantity(&line_id, 11).await.unwrap());
        assert!(!cart.set_quantity("missing", 2).await.unwrap());
        assert!(!cart.remove_from_cart("missing").await.unwrap());

        assert_eq!(store.writes(), 2);
        assert_eq!(cart.items()[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        cart.add_to_cart(&product(1, 10)).await.unwrap();
        let line_id = cart.items()[0].id.to_string();

        assert!(cart.set_quantity(&line_id, 0).await.unwrap());
        assert!(cart.cart().is_empty());
        assert_eq!(store.blob().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_fallback_limit_does_not_rewrite_untouched_lines() {
        let store = MemoryCartStore::default();
        let generous = ShopConfig {
            max_quantity: Some(20),
            ..shop()
        };
        let mut cart = ShopCart::load(store.clone(), generous.clone()).await.unwrap();
        cart.add_to_cart(&product(1, 10)).await.unwrap();
        let line_id = cart.items()[0].id.to_string();
        assert!(cart.set_quantity(&line_id, 15).await.unwrap());

        // Shop configuration unavailable: the default limit applies
        let mut degraded = ShopCart::load(store.clone(), ShopConfig::default()).await.unwrap();
        assert_eq!(degraded.items()[0].quantity, 15);
        assert!(degraded.add_to_cart(&product(2, 4)).await.unwrap());

        let reloaded = ShopCart::load(store.clone(), generous).await.unwrap();
        assert_eq!(reloaded.items()[0].quantity, 15);
        assert_eq!(reloaded.items()[1].quantity, 1);
    }

    #[tokio::test]
    async fn test_corrupt_blob_loads_empty() {
        for blob in [
            r#"{"id":"a"}"#,
            r#"[{"id":"a","quantity":1}]"#,
            "not json",
        ] {
            let store = MemoryCartStore::with_blob(blob);
            let cart = load(&store).await;
            assert!(cart.cart().is_empty(), "blob {blob} should reset");
            assert_eq!(store.writes(), 0);
        }
    }

    #[tokio::test]
    async fn test_shipping_country_defaults_and_persists() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        assert_eq!(cart.shipping_country(), "DE");
        assert_eq!(cart.available_shipping_countries(), vec!["DE", "AT", "US"]);
        assert_eq!(cart.shipping_price(), Decimal::from(5));

        cart.set_shipping_country("us").await.unwrap();
        assert_eq!(cart.shipping_price(), Decimal::from(20));

        let mut reloaded = load(&store).await;
        assert_eq!(reloaded.shipping_country(), "US");

        reloaded.set_shipping_country("FR").await.unwrap();
        assert_eq!(reloaded.shipping_price(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_grand_total_includes_shipping() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        cart.add_to_cart(&product(1, 10)).await.unwrap();
        assert_eq!(cart.grand_total().to_string(), "€15.00");
    }

    #[tokio::test]
    async fn test_clear_empties_cart() {
        let store = MemoryCartStore::default();
        let mut cart = load(&store).await;
        cart.add_to_cart(&product(1, 10)).await.unwrap();
        cart.clear().await.unwrap();

        assert!(load(&store).await.cart().is_empty());
    }
}
