//! Products sold in the shop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::media::{File, Image};
use crate::types::ProductId;

/// A product as served by the content backend.
///
/// The cart stores a full snapshot of this struct at add-to-cart time, so every
/// field except `id` is optional to keep older snapshots readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub details: Option<String>,
    // The CMS field was historically spelled `availible`.
    #[serde(default, alias = "availible")]
    pub available: Option<bool>,
    #[serde(default)]
    pub documents: Vec<File>,
}

impl Product {
    /// Minimal product with just an id, price and name.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            identifier: None,
            name: Some(name.into()),
            description: None,
            image: None,
            price: Some(price),
            images: Vec::new(),
            details: None,
            available: None,
            documents: Vec::new(),
        }
    }

    /// Unit price, with a missing price counting as zero.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed product")
    }

    /// Products are purchasable unless explicitly marked unavailable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.unwrap_or(true)
    }

    /// Path segment used by the storefront product page.
    #[must_use]
    pub fn route_key(&self) -> String {
        self.identifier
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Copy of the product without the fields a cart snapshot never needs.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            details: None,
            documents: Vec::new(),
            images: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_number_and_string() {
        let from_number: Product =
            serde_json::from_str(r#"{"id": 1, "price": 9.99, "availible": false}"#).unwrap();
        assert_eq!(from_number.price, Some(Decimal::new(999, 2)));
        assert!(!from_number.is_available());

        let from_string: Product = serde_json::from_str(r#"{"id": 1, "price": "9.99"}"#).unwrap();
        assert_eq!(from_string.price, Some(Decimal::new(999, 2)));
        assert!(from_string.is_available());
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let product: Product = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(product.unit_price(), Decimal::ZERO);
        assert_eq!(product.route_key(), "3");
    }

    #[test]
    fn test_snapshot_drops_heavy_fields() {
        let mut product = Product::new(ProductId::new(2), "Lamp", Decimal::from(40));
        product.details = Some("long markdown".to_string());
        let snapshot = product.snapshot();
        assert_eq!(snapshot.details, None);
        assert_eq!(snapshot.name.as_deref(), Some("Lamp"));
    }
}
