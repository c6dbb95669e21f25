//! Page and single-type handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use emporium_core::{CookieConfig, GlobalData, Integrations, Page, ShopConfig};

use crate::db::{PageRepository, SingleType, SingleTypeRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Page at `path`, with malformed sections degraded rather than failing.
#[instrument(skip(state))]
pub async fn page(State(state): State<AppState>, Path(path): Path<String>) -> Result<Json<Page>> {
    PageRepository::new(state.pool())
        .get_by_path(&path)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("page".to_string()))
}

async fn single<T>(state: &AppState, kind: SingleType) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    Ok(SingleTypeRepository::new(state.pool()).get(kind).await?)
}

#[instrument(skip(state))]
pub async fn global(State(state): State<AppState>) -> Result<Json<GlobalData>> {
    single(&state, SingleType::Global).await.map(Json)
}

/// Integration settings with the captcha secret and notification settings removed.
#[instrument(skip(state))]
pub async fn integrations(State(state): State<AppState>) -> Result<Json<Integrations>> {
    let integrations: Integrations = single(&state, SingleType::Integrations).await?;
    Ok(Json(integrations.sanitized()))
}

#[instrument(skip(state))]
pub async fn cookies(State(state): State<AppState>) -> Result<Json<CookieConfig>> {
    single(&state, SingleType::Cookies).await.map(Json)
}

#[instrument(skip(state))]
pub async fn shop(State(state): State<AppState>) -> Result<Json<ShopConfig>> {
    single(&state, SingleType::Shop).await.map(Json)
}
