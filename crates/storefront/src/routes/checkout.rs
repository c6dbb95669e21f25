//! Checkout: turn the session cart into an order on the content backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use emporium_core::{Email, Order};

use crate::cart::{CartStore, ShopCart};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::ClientIp;
use crate::models::Flash;
use crate::notifications::{CART_UPDATED, HxTrigger, is_htmx, push_flash};
use crate::routes::cart::load_cart;
use crate::routes::notify_only;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Falls back to the country chosen in the cart
    pub shipping_country: Option<String>,
    pub captcha_token: Option<String>,
}

/// Order confirmation fragment (replaces the cart for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_success.html")]
pub struct CheckoutSuccessTemplate {
    pub first_name: String,
    pub email: String,
}

/// Build the order from a validated form and the cart, or say what is wrong.
///
/// Totals come from the cart; the backend recomputes them from its own prices.
pub(crate) fn build_order<S: CartStore>(
    form: &CheckoutForm,
    cart: &ShopCart<S>,
    captcha_required: bool,
) -> std::result::Result<Order, String> {
    let first_name = form.first_name.trim();
    let last_name = form.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err("Please enter your first and last name.".to_owned());
    }

    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address.".to_owned())?;

    if cart.cart().is_empty() {
        return Err("Your cart is empty.".to_owned());
    }

    let country = form
        .shipping_country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map_or_else(|| cart.shipping_country().to_owned(), str::to_ascii_uppercase);
    let shop = cart.shop();
    if !shop.shipping.is_empty() && !shop.ships_to(&country) {
        return Err(format!("We do not ship to {country}."));
    }

    if captcha_required && form.captcha_token.as_deref().is_none_or(str::is_empty) {
        return Err("Please confirm that you are not a robot.".to_owned());
    }

    let order = Order {
        id: None,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email,
        shipping_price: shop.shipping_price(&country),
        shipping_country: country,
        total_price: cart.total_price(),
        items: cart.order_items(),
        created_at: None,
    };
    order.validate().map_err(|e| e.to_string())?;
    Ok(order)
}

/// Submit the order; the cart is cleared only after the backend accepted it.
#[instrument(skip(state, session, client_ip, headers, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);
    let mut cart = load_cart(&state, &session).await?;

    let captcha_required = match state.backend().integrations().await {
        Ok(integrations) => integrations.captcha_enabled(),
        Err(e) => {
            tracing::warn!(error = e.message(), "Failed to load integrations for checkout");
            false
        }
    };

    let order = match build_order(&form, &cart, captcha_required) {
        Ok(order) => order,
        Err(message) => {
            return Ok(notify_only(htmx, &session, Flash::warning(message), "/cart").await);
        }
    };

    let token = form.captcha_token.as_deref().filter(|t| !t.is_empty());
    if let Err(e) = state.backend().submit_order(&order, token, client_ip).await {
        tracing::warn!(status = e.status(), error = e.message(), "Order submission failed");
        let flash = Flash::error(format!("Your order could not be placed: {}", e.message()));
        return Ok(notify_only(htmx, &session, flash, "/cart").await);
    }

    add_breadcrumb("checkout", "Order placed", &[]);
    tracing::info!(items = order.item_count(), "Order placed");
    cart.clear().await?;

    let flash = Flash::success("Thank you! Your order has been placed.");
    if htmx {
        let trigger = HxTrigger::new().event(CART_UPDATED).notify(&flash);
        let template = CheckoutSuccessTemplate {
            first_name: order.first_name,
            email: order.email.as_str().to_owned(),
        };
        return Ok((trigger.headers(), template).into_response());
    }

    push_flash(&session, flash).await;
    Ok(Redirect::to("/cart").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use emporium_core::{Product, ShippingTier, ShopConfig};

    use crate::cart::MemoryCartStore;

    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            shipping_country: None,
            captcha_token: None,
        }
    }

    async fn cart_with_item() -> ShopCart<MemoryCartStore> {
        let shop = ShopConfig {
            shipping: vec![ShippingTier {
                id: None,
                countries: vec!["DE".to_string()],
                price: Decimal::new(500, 2),
            }],
            ..ShopConfig::default()
        };
        let mut cart = ShopCart::load(MemoryCartStore::default(), shop).await.unwrap();
        cart.add_to_cart(&Product::new(3.into(), "Kettle", Decimal::new(3000, 2)))
            .await
            .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_builds_order_from_cart() {
        let cart = cart_with_item().await;
        let order = build_order(&form(), &cart, false).unwrap();
        assert_eq!(order.first_name, "Ada");
        assert_eq!(order.shipping_country, "DE");
        assert_eq!(order.total_price, Decimal::new(3000, 2));
        assert_eq!(order.shipping_price, Decimal::new(500, 2));
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_forms() {
        let cart = cart_with_item().await;

        let bad_email = CheckoutForm {
            email: "nope".to_string(),
            ..form()
        };
        assert!(build_order(&bad_email, &cart, false).is_err());

        let other_country = CheckoutForm {
            shipping_country: Some("us".to_string()),
            ..form()
        };
        assert_eq!(
            build_order(&other_country, &cart, false).unwrap_err(),
            "We do not ship to US."
        );

        assert!(build_order(&form(), &cart, true).is_err());
        let with_token = CheckoutForm {
            captcha_token: Some("token".to_string()),
            ..form()
        };
        assert!(build_order(&with_token, &cart, true).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_empty_cart() {
        let cart = ShopCart::load(MemoryCartStore::default(), ShopConfig::default())
            .await
            .unwrap();
        assert_eq!(build_order(&form(), &cart, false).unwrap_err(), "Your cart is empty.");
    }
}
