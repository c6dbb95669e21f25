//! Cart line items and their persisted form.
//!
//! [`Cart`] is the pure collection behind the storefront cart: it enforces the
//! per-line quantity limit and derives totals, but knows nothing about where it
//! is stored. The storefront loads it from a blob, mutates it and writes the
//! blob back after every successful mutation.
//!
//! The blob is the JSON text of the line array:
//!
//! ```json
//! [{ "id": "3fa4c0de91b2", "product": { "id": 1, "price": 10 }, "quantity": 2 }]
//! ```

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{OrderItem, Product};
use crate::types::{ProductId, random_hex};

/// Length of a generated line id in hex characters.
const LINE_ID_LEN: usize = 12;

/// Opaque identifier of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineId(String);

impl CartLineId {
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex(LINE_ID_LEN))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CartLineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A product snapshot and how many of it the customer wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartLineId,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.unit_price() * Decimal::from(self.quantity)
    }
}

/// Why a persisted cart blob was rejected.
#[derive(thiserror::Error, Debug)]
pub enum CartBlobError {
    #[error("cart blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cart blob is not an array")]
    NotAnArray,
    #[error("cart entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Ordered cart lines with a per-line quantity limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
    max_quantity: u32,
}

impl Cart {
    #[must_use]
    pub const fn new(max_quantity: u32) -> Self {
        Self {
            items: Vec::new(),
            max_quantity,
        }
    }

    /// Hydrate a cart from its persisted blob.
    ///
    /// A missing or invalid blob yields an empty cart; a structurally bad
    /// entry discards the whole cart rather than keeping part of it. Stored
    /// quantities are kept as they are; the limit only applies to mutations.
    #[must_use]
    pub fn from_blob(blob: Option<&str>, max_quantity: u32) -> Self {
        let Some(blob) = blob else {
            return Self::new(max_quantity);
        };

        match parse_blob(blob) {
            Ok(items) => Self {
                items,
                max_quantity,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Discarding corrupt cart blob");
                Self::new(max_quantity)
            }
        }
    }

    /// Serialize the lines to the persisted blob format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_blob(&self) -> Result<String, CartBlobError> {
        Ok(serde_json::to_string(&self.items)?)
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn get(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id.as_str() == line_id)
    }

    #[must_use]
    pub fn line_for_product(&self, product: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product)
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product, or appends a new line
    /// with quantity 1. Returns `false` without changing anything when the
    /// existing line is already at the limit.
    pub fn add(&mut self, product: &Product) -> bool {
        if let Some(item) = self.items.iter_mut().find(|item| item.product.id == product.id) {
            if item.quantity >= self.max_quantity {
                return false;
            }
            item.quantity += 1;
            return true;
        }

        if self.max_quantity == 0 {
            return false;
        }
        self.items.push(CartItem {
            id: CartLineId::generate(),
            product: product.snapshot(),
            quantity: 1,
        });
        true
    }

    /// Replace the quantity of a line.
    ///
    /// Returns `false` for an unknown line or a quantity above the limit.
    /// A quantity of zero or less removes the line.
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> bool {
        let Some(index) = self.position(line_id) else {
            return false;
        };
        if quantity > i64::from(self.max_quantity) {
            return false;
        }

        match u32::try_from(quantity) {
            Ok(q) if q > 0 => self.items[index].quantity = q,
            _ => {
                self.items.remove(index);
            }
        }
        true
    }

    /// Remove a line. Returns whether a line was removed.
    pub fn remove(&mut self, line_id: &str) -> bool {
        self.position(line_id)
            .map(|index| self.items.remove(index))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals; lines without a price count as zero.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items
            .iter()
            .map(|item| OrderItem::new(item.product.id, item.quantity))
            .collect()
    }

    fn position(&self, line_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id.as_str() == line_id)
    }
}

/// Parse and structurally validate a cart blob.
///
/// Every element must be an object with a non-empty string `id`, an object
/// `product` carrying a numeric `id`, and a positive integer `quantity`.
///
/// # Errors
///
/// Returns [`CartBlobError`] for the first problem found.
pub fn parse_blob(blob: &str) -> Result<Vec<CartItem>, CartBlobError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(blob)? else {
        return Err(CartBlobError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            parse_entry(entry).map_err(|reason| CartBlobError::InvalidEntry { index, reason })
        })
        .collect()
}

fn parse_entry(entry: Value) -> Result<CartItem, String> {
    let Value::Object(mut fields) = entry else {
        return Err("not an object".to_owned());
    };

    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => CartLineId(id),
        _ => return Err("missing line id".to_owned()),
    };

    let product = match fields.remove("product") {
        Some(product @ Value::Object(_)) => {
            serde_json::from_value::<Product>(product).map_err(|e| format!("bad product: {e}"))?
        }
        _ => return Err("missing product".to_owned()),
    };

    let quantity = fields
        .get("quantity")
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .ok_or_else(|| "quantity must be a positive integer".to_owned())?;

    Ok(CartItem {
        id,
        product,
        quantity,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_MAX_QUANTITY;

    fn product(id: i32, price: i64) -> Product {
        Product::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
    }

    fn cart() -> Cart {
        Cart::new(DEFAULT_MAX_QUANTITY)
    }

    #[test]
    fn test_add_new_product_appends_line() {
        let mut cart = cart();
        assert!(cart.add(&product(1, 10)));
        assert!(cart.add(&product(2, 5)));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.items()[1].id.as_str().len(), 12);
        assert_ne!(cart.items()[0].id, cart.items()[1].id);
    }

    #[test]
    fn test_add_existing_product_increments() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        cart.add(&product(1, 10));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_add_refused_at_max() {
        let mut cart = cart();
        for _ in 0..10 {
            assert!(cart.add(&product(1, 10)));
        }
        let before = cart.clone();

        assert!(!cart.add(&product(1, 10)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_above_max_refused() {
        let mut cart = Cart::new(3);
        cart.add(&product(1, 10));
        let line = cart.items()[0].id.to_string();
        let before = cart.clone();

        assert!(!cart.set_quantity(&line, 4));
        assert_eq!(cart, before);
        assert!(cart.set_quantity(&line, 3));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        assert!(!cart.set_quantity("missing", 2));
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes_line() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        cart.add(&product(2, 10));
        let first = cart.items()[0].id.to_string();
        let second = cart.items()[1].id.to_string();

        assert!(cart.set_quantity(&first, 0));
        assert!(cart.set_quantity(&second, -3));
        assert!(cart.is_empty());
        assert!(cart.items().iter().all(|item| item.quantity > 0));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        let before = cart.clone();

        assert!(!cart.remove("does-not-exist"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_totals_follow_mutations() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        cart.add(&product(2, 3));
        cart.add(&product(2, 3));
        let mut unpriced = product(3, 0);
        unpriced.price = None;
        cart.add(&unpriced);

        assert_eq!(cart.total_quantity(), 4);
        assert_eq!(cart.total_price(), Decimal::from(16));

        let line = cart.line_for_product(ProductId::new(1)).unwrap().id.to_string();
        cart.set_quantity(&line, 5);
        assert_eq!(cart.total_price(), Decimal::from(56));

        let line = cart.line_for_product(ProductId::new(2)).unwrap().id.to_string();
        cart.remove(&line);
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.total_price(), Decimal::from(50));
    }

    #[test]
    fn test_totals_independent_of_operation_order() {
        let mut a = cart();
        a.add(&product(1, 10));
        a.add(&product(2, 7));
        a.add(&product(1, 10));

        let mut b = cart();
        b.add(&product(2, 7));
        b.add(&product(1, 10));
        let line = b.line_for_product(ProductId::new(1)).unwrap().id.to_string();
        b.set_quantity(&line, 2);

        assert_eq!(a.total_price(), b.total_price());
        assert_eq!(a.total_quantity(), b.total_quantity());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut cart = cart();
        assert!(cart.add(&product(1, 10)));
        assert!(cart.add(&product(1, 10)));
        let line = cart.items()[0].id.to_string();
        assert!(cart.set_quantity(&line, 3));
        assert!(!cart.remove("other-line"));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_price(), Decimal::from(30));
    }

    #[test]
    fn test_blob_round_trip_preserves_lines() {
        let mut cart = cart();
        cart.add(&product(1, 10));
        cart.add(&product(1, 10));
        let blob = cart.to_blob().unwrap();

        let restored = Cart::from_blob(Some(&blob), DEFAULT_MAX_QUANTITY);
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_corrupt_blobs_yield_empty_cart() {
        let corrupt = [
            "not json",
            r#"{"id": "abc", "product": {"id": 1}, "quantity": 1}"#,
            r#"[{"id": "abc", "quantity": 1}]"#,
            r#"[{"id": "abc", "product": {"id": 1}}]"#,
            r#"[{"id": "abc", "product": {"id": 1}, "quantity": "2"}]"#,
            r#"[{"id": "abc", "product": {"id": 1}, "quantity": 0}]"#,
            r#"[{"id": 5, "product": {"id": 1}, "quantity": 1}]"#,
            r#"[{"id": "abc", "product": "shoe", "quantity": 1}]"#,
            r#"[{"id": "ok", "product": {"id": 1}, "quantity": 1}, 42]"#,
        ];

        for blob in corrupt {
            let cart = Cart::from_blob(Some(blob), DEFAULT_MAX_QUANTITY);
            assert!(cart.is_empty(), "blob should be discarded: {blob}");
        }
    }

    #[test]
    fn test_parse_blob_reports_entry_index() {
        let err = parse_blob(r#"[{"id": "a", "product": {"id": 1}, "quantity": 1}, {"id": "b"}]"#)
            .unwrap_err();
        assert!(matches!(err, CartBlobError::InvalidEntry { index: 1, .. }));
        assert!(matches!(parse_blob("{}").unwrap_err(), CartBlobError::NotAnArray));
    }

    #[test]
    fn test_from_blob_keeps_quantities_above_current_limit() {
        let blob = r#"[{"id": "a1b2c3d4e5f6", "product": {"id": 1, "price": 2}, "quantity": 8}]"#;
        let mut cart = Cart::from_blob(Some(blob), 5);
        assert_eq!(cart.items()[0].quantity, 8);
        assert_eq!(cart.total_price(), Decimal::from(16));

        assert!(!cart.add(&product(1, 2)));
        assert!(!cart.set_quantity("a1b2c3d4e5f6", 6));
        assert!(cart.set_quantity("a1b2c3d4e5f6", 4));
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_order_items_reference_products() {
        let mut cart = cart();
        cart.add(&product(4, 1));
        cart.add(&product(4, 1));
        assert_eq!(cart.order_items(), vec![OrderItem::new(ProductId::new(4), 2)]);
    }
}
