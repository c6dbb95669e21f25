//! Orders and contact messages submitted by customers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Email, MessageId, OrderId, ProductId};

/// Reasons a submitted order or message is refused before it is stored.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("order has no items")]
    EmptyOrder,
    #[error("quantity for product {0} must be at least 1")]
    InvalidQuantity(ProductId),
}

/// Reference to a product by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductRef,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub const fn new(product: ProductId, quantity: u32) -> Self {
        Self {
            product: ProductRef { id: product },
            quantity,
        }
    }
}

/// An order as submitted at checkout and as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub shipping_country: String,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub shipping_price: Decimal,
    pub items: Vec<OrderItem>,
    #[serde(default, rename = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Check required fields and line quantities.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("shippingCountry", &self.shipping_country)?;

        if self.items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(ValidationError::InvalidQuantity(item.product.id));
        }
        Ok(())
    }

    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// A contact-form message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub salutation: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    #[serde(default)]
    pub subject: Option<String>,
    pub content: String,
    #[serde(default, rename = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for the first blank required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("content", &self.content)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "shippingCountry": "DE",
            "totalPrice": 59.98,
            "shippingPrice": 5,
            "items": [{ "product": { "id": 1 }, "quantity": 2 }]
        })
    }

    #[test]
    fn test_order_parses_wire_shape() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.items, vec![OrderItem::new(ProductId::new(1), 2)]);
        assert_eq!(order.total_price, Decimal::new(5998, 2));
        assert_eq!(order.item_count(), 2);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_order_rejects_blank_fields_and_empty_items() {
        let mut order: Order = serde_json::from_value(order_json()).unwrap();
        order.first_name = "  ".to_string();
        assert_eq!(order.validate(), Err(ValidationError::MissingField("firstName")));

        order.first_name = "Ada".to_string();
        order.items.clear();
        assert_eq!(order.validate(), Err(ValidationError::EmptyOrder));

        order.items.push(OrderItem::new(ProductId::new(4), 0));
        assert_eq!(
            order.validate(),
            Err(ValidationError::InvalidQuantity(ProductId::new(4)))
        );
    }

    #[test]
    fn test_order_rejects_invalid_email() {
        let mut json = order_json();
        json["email"] = serde_json::json!("ada");
        assert!(serde_json::from_value::<Order>(json).is_err());
    }

    #[test]
    fn test_message_requires_content() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.com",
            "content": ""
        }))
        .unwrap();
        assert_eq!(message.validate(), Err(ValidationError::MissingField("content")));
    }
}
