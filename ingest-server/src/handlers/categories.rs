//! Taxonomy handler

use axum::{extract::{Query, State}, Json};

use crate::models::{CategoriesQuery, CategoriesResponse};
use crate::{AppResult, AppState};
use super::blocking;

/// Full taxonomy, or the subtree under `?root=`
pub async fn tree(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> AppResult<Json<CategoriesResponse>> {
    let store = state.data_store.clone();
    let categories = blocking(move || store.get_taxonomy_tree(query.root)).await?;
    Ok(Json(CategoriesResponse { categories }))
}
