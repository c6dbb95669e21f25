//! Product handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use emporium_core::{Product, ProductQuery};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product listing; `details` is omitted from every entry.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(&query).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_identifier(&identifier)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product".to_string()))
}
