//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{ImageSize, Product, ProductQuery, ShopConfig, Sort};

use crate::filters::{self, render_optional_markdown};
use crate::layout::Layout;
use crate::middleware::RequestId;
use crate::routes::pages::backend_error_page;
use crate::state::AppState;
use crate::views::{FileView, ImageView};

/// Product card for the listing grid.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub href: String,
    pub name: String,
    pub price: String,
    pub image: Option<ImageView>,
    pub available: bool,
}

impl ProductCardView {
    fn new(product: &Product, shop: &ShopConfig, media_base: &str) -> Self {
        Self {
            id: product.id.as_i32(),
            href: format!("/products/{}", product.route_key()),
            name: product.display_name().to_owned(),
            price: shop.price(product.unit_price()).to_string(),
            image: ImageView::from_option(product.image.as_ref(), ImageSize::Small, media_base),
            available: product.is_available(),
        }
    }
}

/// Full product detail view.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub available: bool,
    pub image: Option<ImageView>,
    pub gallery: Vec<ImageView>,
    /// Rendered Markdown
    pub description: String,
    /// Rendered Markdown
    pub details: String,
    pub documents: Vec<FileView>,
}

impl ProductDetailView {
    fn new(product: &Product, shop: &ShopConfig, media_base: &str) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.display_name().to_owned(),
            price: shop.price(product.unit_price()).to_string(),
            available: product.is_available(),
            image: ImageView::from_option(product.image.as_ref(), ImageSize::Large, media_base),
            gallery: product
                .images
                .iter()
                .filter(|image| !image.url.is_empty())
                .map(|image| ImageView::new(image, ImageSize::Medium, media_base))
                .collect(),
            description: render_optional_markdown(product.description.as_deref()),
            details: render_optional_markdown(product.details.as_deref()),
            documents: product
                .documents
                .iter()
                .map(|file| FileView::new(file, media_base))
                .collect(),
        }
    }
}

/// Sort options offered on the listing page.
pub const SORT_OPTIONS: &[(&str, &str)] = &[
    ("name:ASC", "Name"),
    ("price:ASC", "Price: low to high"),
    ("price:DESC", "Price: high to low"),
    ("created_at:DESC", "Newest"),
];

#[derive(Clone)]
pub struct SortOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Listing query parameters; malformed values are ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl ProductListParams {
    fn to_query(&self) -> ProductQuery {
        let sort = self.sort.as_deref().and_then(|s| match s.parse::<Sort>() {
            Ok(sort) => Some(sort),
            Err(e) => {
                tracing::debug!(sort = s, error = %e, "Ignoring invalid sort");
                None
            }
        });

        ProductQuery {
            q: self.q.clone().filter(|q| !q.trim().is_empty()),
            sort,
            price_gte: parse_price(self.min_price.as_deref()),
            price_lte: parse_price(self.max_price.as_deref()),
            ..ProductQuery::default()
        }
    }

    fn sort_options(&self) -> Vec<SortOptionView> {
        let current = self.sort.as_deref().unwrap_or_default();
        SORT_OPTIONS
            .iter()
            .map(|(value, label)| SortOptionView {
                value: (*value).to_owned(),
                label: (*label).to_owned(),
                selected: *value == current,
            })
            .collect()
    }
}

fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<Decimal>().ok())
        .filter(|v| !v.is_sign_negative())
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
    pub search: String,
    pub sort_options: Vec<SortOptionView>,
    pub min_price: String,
    pub max_price: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
    pub route_key: String,
}

/// Display the product listing.
///
/// A failed backend call shows an empty listing.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
    layout: Layout,
) -> impl IntoResponse {
    let backend = state.backend();
    let query = params.to_query();
    let (products, shop) = tokio::join!(backend.list_products(&query), backend.shop());

    let products = products.unwrap_or_else(|e| {
        tracing::warn!(status = e.status(), error = e.message(), "Failed to list products");
        Vec::new()
    });
    let shop = shop.unwrap_or_default();
    let media_base = &state.config().api_url;

    ProductsIndexTemplate {
        layout: layout.titled(Some("Products")),
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, &shop, media_base))
            .collect(),
        search: params.q.clone().unwrap_or_default(),
        sort_options: params.sort_options(),
        min_price: params.min_price.clone().unwrap_or_default(),
        max_price: params.max_price.clone().unwrap_or_default(),
    }
}

/// Display a single product by identifier (slug or numeric id).
#[instrument(skip(state, layout, request_id))]
pub async fn show(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    layout: Layout,
    RequestId(request_id): RequestId,
) -> Response {
    let backend = state.backend();
    let (product, shop) = tokio::join!(backend.get_product(&identifier), backend.shop());

    let product = match product {
        Ok(product) => product,
        Err(e) => return backend_error_page(layout, &e, request_id),
    };
    let shop = shop.unwrap_or_default();

    ProductShowTemplate {
        layout: layout
            .titled(product.name.as_deref())
            .described(product.description.as_deref(), None),
        route_key: product.route_key(),
        product: ProductDetailView::new(&product, &shop, &state.config().api_url),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sort_and_prices_are_ignored() {
        let params = ProductListParams {
            q: Some("  ".to_string()),
            sort: Some("price;drop".to_string()),
            min_price: Some("-5".to_string()),
            max_price: Some("20.50".to_string()),
        };
        let query = params.to_query();
        assert_eq!(query.q, None);
        assert_eq!(query.sort, None);
        assert_eq!(query.price_gte, None);
        assert_eq!(query.price_lte, Some(Decimal::new(2050, 2)));
    }

    #[test]
    fn test_sort_option_selection() {
        let params = ProductListParams {
            sort: Some("price:DESC".to_string()),
            ..ProductListParams::default()
        };
        let selected: Vec<_> = params
            .sort_options()
            .into_iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect();
        assert_eq!(selected, vec!["price:DESC".to_string()]);
    }

    #[test]
    fn test_card_links_by_identifier() {
        let mut product = Product::new(7.into(), "Teapot", Decimal::new(1999, 2));
        product.identifier = Some("teapot-7".to_string());
        let card = ProductCardView::new(&product, &ShopConfig::default(), "http://cms.test");
        assert_eq!(card.href, "/products/teapot-7");
        assert_eq!(card.price, "€19.99");
        assert!(card.available);
    }
}
