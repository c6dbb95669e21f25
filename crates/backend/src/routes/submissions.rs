//! Contact message and order submission handlers.
//!
//! Both endpoints require a valid `captchaToken` query parameter whenever the
//! captcha integration is enabled. Orders are re-priced from the stored
//! products and shipping tiers before they are saved.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Integrations, Message, Order, OrderItem, Product, ShopConfig};

use crate::db::{
    MessageRepository, OrderRepository, ProductRepository, SingleType, SingleTypeRepository,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CaptchaParams {
    #[serde(rename = "captchaToken", default)]
    pub captcha_token: Option<String>,
}

/// Server-side order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_price: Decimal,
    pub shipping_price: Decimal,
}

/// Reject the request unless captcha is disabled or the token verifies.
async fn require_captcha(state: &AppState, token: Option<&str>) -> Result<()> {
    let integrations: Integrations = SingleTypeRepository::new(state.pool())
        .get(SingleType::Integrations)
        .await?;

    if !integrations.captcha_enabled() {
        return Ok(());
    }

    let secret = integrations.captcha_secret().unwrap_or_default();
    if state.captcha().verify(token, secret).await {
        Ok(())
    } else {
        Err(AppError::InvalidCaptcha)
    }
}

#[instrument(skip(state, params, message), fields(email = %message.email))]
pub async fn create_message(
    State(state): State<AppState>,
    Query(params): Query<CaptchaParams>,
    Json(message): Json<Message>,
) -> Result<Json<Message>> {
    require_captcha(&state, params.captcha_token.as_deref()).await?;
    message.validate()?;

    let stored = MessageRepository::new(state.pool()).create(&message).await?;
    add_breadcrumb("submission", "Contact message stored");
    Ok(Json(stored))
}

#[instrument(skip(state, params, order), fields(items = order.items.len()))]
pub async fn create_order(
    State(state): State<AppState>,
    Query(params): Query<CaptchaParams>,
    Json(order): Json<Order>,
) -> Result<Json<Order>> {
    require_captcha(&state, params.captcha_token.as_deref()).await?;
    order.validate()?;

    let shop: ShopConfig = SingleTypeRepository::new(state.pool())
        .get(SingleType::Shop)
        .await?;
    let ids: Vec<_> = order.items.iter().map(|item| item.product.id).collect();
    let products = ProductRepository::new(state.pool()).get_by_ids(&ids).await?;

    let totals = compute_totals(&order.items, &products, &shop, &order.shipping_country)?;
    if totals.total_price != order.total_price || totals.shipping_price != order.shipping_price {
        tracing::warn!(
            client_total = %order.total_price,
            server_total = %totals.total_price,
            client_shipping = %order.shipping_price,
            server_shipping = %totals.shipping_price,
            "Order totals differ from submitted values"
        );
    }

    let priced = Order {
        total_price: totals.total_price,
        shipping_price: totals.shipping_price,
        shipping_country: order.shipping_country.trim().to_ascii_uppercase(),
        ..order
    };

    let stored = OrderRepository::new(state.pool()).create(&priced).await?;
    add_breadcrumb("submission", "Order stored");
    Ok(Json(stored))
}

/// Price `items` against the stored products and the shop's shipping tiers.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for unknown or unavailable products,
/// quantities above the shop limit, or a country no tier ships to.
pub fn compute_totals(
    items: &[OrderItem],
    products: &[Product],
    shop: &ShopConfig,
    shipping_country: &str,
) -> Result<OrderTotals> {
    let country = shipping_country.trim().to_ascii_uppercase();
    if !shop.shipping.is_empty() && !shop.ships_to(&country) {
        return Err(AppError::BadRequest(format!(
            "shipping to {country} is not available"
        )));
    }

    let max_quantity = shop.max_quantity();
    let mut total_price = Decimal::ZERO;

    for item in items {
        let id = item.product.id;
        let product = products
            .iter()
            .find(|product| product.id == id)
            .ok_or_else(|| AppError::BadRequest(format!("unknown product {id}")))?;

        if !product.is_available() {
            return Err(AppError::BadRequest(format!("product {id} is not available")));
        }
        if item.quantity > max_quantity {
            return Err(AppError::BadRequest(format!(
                "quantity for product {id} exceeds {max_quantity}"
            )));
        }

        total_price += product.unit_price() * Decimal::from(item.quantity);
    }

    Ok(OrderTotals {
        total_price,
        shipping_price: shop.shipping_price(&country),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{ProductId, ShippingTier};

    use super::*;

    fn shop() -> ShopConfig {
        ShopConfig {
            max_quantity: Some(3),
            shipping: vec![
                ShippingTier {
                    id: None,
                    countries: vec!["DE".to_string(), "AT".to_string()],
                    price: Decimal::new(490, 2),
                },
                ShippingTier {
                    id: None,
                    countries: vec!["CH".to_string()],
                    price: Decimal::new(1500, 2),
                },
            ],
            ..ShopConfig::default()
        }
    }

    fn products() -> Vec<Product> {
        let mut unavailable = Product::new(ProductId::new(3), "Sold out", Decimal::from(5));
        unavailable.available = Some(false);
        vec![
            Product::new(ProductId::new(1), "Mug", Decimal::new(1250, 2)),
            Product::new(ProductId::new(2), "Poster", Decimal::new(2000, 2)),
            unavailable,
        ]
    }

    #[test]
    fn test_totals_use_stored_prices() {
        let items = [
            OrderItem::new(ProductId::new(1), 2),
            OrderItem::new(ProductId::new(2), 1),
        ];
        let totals = compute_totals(&items, &products(), &shop(), "ch").unwrap();
        assert_eq!(totals.total_price, Decimal::new(4500, 2));
        assert_eq!(totals.shipping_price, Decimal::new(1500, 2));
    }

    #[test]
    fn test_unknown_or_unavailable_products_rejected() {
        let unknown = [OrderItem::new(ProductId::new(99), 1)];
        assert!(matches!(
            compute_totals(&unknown, &products(), &shop(), "DE"),
            Err(AppError::BadRequest(msg)) if msg.contains("99")
        ));

        let sold_out = [OrderItem::new(ProductId::new(3), 1)];
        assert!(compute_totals(&sold_out, &products(), &shop(), "DE").is_err());
    }

    #[test]
    fn test_quantity_above_limit_rejected() {
        let items = [OrderItem::new(ProductId::new(1), 4)];
        assert!(compute_totals(&items, &products(), &shop(), "DE").is_err());
    }

    #[test]
    fn test_unserved_country_rejected_only_when_tiers_exist() {
        let items = [OrderItem::new(ProductId::new(1), 1)];
        assert!(compute_totals(&items, &products(), &shop(), "FR").is_err());

        let no_tiers = ShopConfig::default();
        let totals = compute_totals(&items, &products(), &no_tiers, "FR").unwrap();
        assert_eq!(totals.shipping_price, Decimal::ZERO);
    }
}
