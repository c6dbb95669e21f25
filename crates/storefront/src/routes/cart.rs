//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads;
//! without HTMX every mutation redirects back with a flash message. The cart
//! itself lives in the session (see [`crate::cart`]).

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

use emporium_core::{CartItem, ImageSize, ShopConfig};

use crate::cart::{CartStore, SessionCartStore, ShopCart};
use crate::error::Result;
use crate::filters::{self, render_optional_markdown};
use crate::layout::Layout;
use crate::models::Flash;
use crate::notifications::{CART_UPDATED, HxTrigger, is_htmx, push_flash};
use crate::routes::{back_path, notify_only};
use crate::state::AppState;
use crate::views::ImageView;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<ImageView>,
}

/// Shipping destination choice.
#[derive(Clone)]
pub struct CountryOption {
    pub code: String,
    pub selected: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_quantity: u64,
    pub max_quantity: u32,
    pub subtotal: String,
    pub shipping: String,
    pub grand_total: String,
    pub shipping_country: String,
    pub countries: Vec<CountryOption>,
}

impl CartView {
    #[must_use]
    pub fn new<S: CartStore>(cart: &ShopCart<S>, media_base: &str) -> Self {
        let shop = cart.shop();
        let selected = cart.shipping_country();
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| CartLineView::new(item, shop, media_base))
                .collect(),
            total_quantity: cart.total_quantity(),
            max_quantity: cart.max_quantity(),
            subtotal: shop.price(cart.total_price()).to_string(),
            shipping: shop.price(cart.shipping_price()).to_string(),
            grand_total: cart.grand_total().to_string(),
            shipping_country: selected.to_owned(),
            countries: cart
                .available_shipping_countries()
                .into_iter()
                .map(|code| CountryOption {
                    code: code.to_owned(),
                    selected: code == selected,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl CartLineView {
    fn new(item: &CartItem, shop: &ShopConfig, media_base: &str) -> Self {
        Self {
            id: item.id.to_string(),
            href: format!("/products/{}", item.product.route_key()),
            name: item.product.display_name().to_owned(),
            quantity: item.quantity,
            unit_price: shop.price(item.product.unit_price()).to_string(),
            line_total: shop.price(item.line_total()).to_string(),
            image: ImageView::from_option(
                item.product.image.as_ref(),
                ImageSize::Thumbnail,
                media_base,
            ),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    /// Product identifier (slug or numeric id)
    pub product: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Shipping country form data.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    pub country: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    /// Rendered Markdown
    pub shipping_info: String,
    /// Rendered Markdown
    pub checkout_message: String,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load the visitor's cart against the current shop configuration.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(state: &AppState, session: &Session) -> Result<ShopCart<SessionCartStore>> {
    let shop = state.backend().shop().await.unwrap_or_else(|e| {
        tracing::warn!(error = e.message(), "Failed to load shop configuration");
        ShopConfig::default()
    });
    Ok(ShopCart::load(SessionCartStore::new(session.clone()), shop).await?)
}

/// Respond after an update, remove or shipping change.
///
/// HTMX gets the refreshed items fragment (plus a warning when the change was
/// refused); plain posts are redirected to the cart page.
async fn items_response(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    cart: &ShopCart<SessionCartStore>,
    changed: bool,
    refusal: Option<Flash>,
) -> Response {
    if is_htmx(headers) {
        let mut trigger = HxTrigger::new();
        if changed {
            trigger = trigger.event(CART_UPDATED);
        }
        if let Some(flash) = &refusal {
            trigger = trigger.notify(flash);
        }
        let cart = CartView::new(cart, &state.config().api_url);
        return (trigger.headers(), CartItemsTemplate { cart }).into_response();
    }

    if let Some(flash) = refusal {
        push_flash(session, flash).await;
    }
    Redirect::to("/cart").into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, layout))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&state, &session).await?;

    Ok(CartShowTemplate {
        layout: layout.titled(Some("Cart")),
        shipping_info: render_optional_markdown(cart.shop().shipping_info.as_deref()),
        checkout_message: render_optional_markdown(cart.shop().checkout_message.as_deref()),
        cart: CartView::new(&cart, &state.config().api_url),
    })
}

/// Add one unit of a product.
///
/// The product is re-fetched so the cart snapshot carries the backend's
/// current price. Refusals (unknown, unavailable, at the limit) surface as a
/// warning.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);
    let back_to = back_path(&headers, "/cart");

    let product = match state.backend().get_product(&form.product).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(product = %form.product, error = e.message(), "Add to cart failed");
            let flash = Flash::error("This product could not be found.");
            return Ok(notify_only(htmx, &session, flash, &back_to).await);
        }
    };

    if !product.is_available() {
        let flash = Flash::warning(format!("{} is currently unavailable.", product.display_name()));
        return Ok(notify_only(htmx, &session, flash, &back_to).await);
    }

    let mut cart = load_cart(&state, &session).await?;
    if !cart.add_to_cart(&product).await? {
        let flash = Flash::warning(format!(
            "You can order at most {} of {}.",
            cart.max_quantity(),
            product.display_name()
        ));
        return Ok(notify_only(htmx, &session, flash, &back_to).await);
    }

    crate::error::add_breadcrumb(
        "cart",
        "Added product",
        &[("product", form.product.as_str())],
    );
    let flash = Flash::success(format!("{} was added to your cart.", product.display_name()));

    if htmx {
        let trigger = HxTrigger::new().event(CART_UPDATED).notify(&flash);
        let count = cart.total_quantity();
        return Ok((trigger.headers(), CartCountTemplate { count }).into_response());
    }

    push_flash(&session, flash).await;
    Ok(Redirect::to(&back_to).into_response())
}

/// Update cart item quantity; zero or less removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&state, &session).await?;
    let changed = cart.set_quantity(&form.line_id, form.quantity).await?;

    let refusal = (!changed && cart.cart().get(&form.line_id).is_some()).then(|| {
        Flash::warning(format!(
            "You can order at most {} of each product.",
            cart.max_quantity()
        ))
    });

    Ok(items_response(&state, &session, &headers, &cart, changed, refusal).await)
}

/// Remove item from cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&state, &session).await?;
    let changed = cart.remove_from_cart(&form.line_id).await?;

    Ok(items_response(&state, &session, &headers, &cart, changed, None).await)
}

/// Choose the shipping destination.
///
/// Countries outside the shop's shipping tiers are refused when tiers exist.
#[instrument(skip(state, session, headers))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let mut cart = load_cart(&state, &session).await?;
    let country = form.country.trim().to_ascii_uppercase();

    let ships = cart.shop().shipping.is_empty() || cart.shop().ships_to(&country);
    if !ships || country.is_empty() {
        let refusal = Flash::warning(format!("We do not ship to {country}."));
        return Ok(items_response(&state, &session, &headers, &cart, false, Some(refusal)).await);
    }

    let changed = country != cart.shipping_country();
    cart.set_shipping_country(&country).await?;

    Ok(items_response(&state, &session, &headers, &cart, changed, None).await)
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&state, &session).await?;
    Ok(CartCountTemplate {
        count: cart.total_quantity(),
    })
}
