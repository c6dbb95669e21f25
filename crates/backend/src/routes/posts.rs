//! Post handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use emporium_core::{Post, PostQuery};

use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Post listing; `content` is omitted from every entry.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Vec<Post>>> {
    let posts = PostRepository::new(state.pool()).list(&query).await?;
    Ok(Json(posts))
}

/// Number of posts matching the same filters as the listing.
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<i64>> {
    let count = PostRepository::new(state.pool()).count(&query).await?;
    Ok(Json(count))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Post>> {
    PostRepository::new(state.pool())
        .get_by_identifier(&identifier)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("post".to_string()))
}
