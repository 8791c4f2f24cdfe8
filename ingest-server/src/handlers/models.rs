//! Model definition handlers

use axum::{extract::{Path, State}, Json};
use serde_json::{json, Value};
use validator::Validate;

use wearwatch_core::{validate_definition, ModelDefinition, NodeId};

use crate::events::{MODEL_DELETED, MODEL_UPDATED};
use crate::models::ModelDefinitionRequest;
use crate::{AppError, AppResult, AppState};
use super::blocking;

/// Get the definition for a category
pub async fn get(
    State(state): State<AppState>,
    Path(category_id): Path<NodeId>,
) -> AppResult<Json<ModelDefinition>> {
    let store = state.result_store.clone();
    let definition = blocking(move || store.get_model_definition(category_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Model definition not found".to_string()))?;
    Ok(Json(definition))
}

/// Create or replace the definition of a leaf category, then re-analyse it
pub async fn put(
    State(state): State<AppState>,
    Path(category_id): Path<NodeId>,
    Json(req): Json<ModelDefinitionRequest>,
) -> AppResult<Json<ModelDefinition>> {
    req.validate()?;
    let definition = req.into_definition(category_id);
    validate_definition(&definition)?;

    let data_store = state.data_store.clone();
    let subtree = blocking(move || data_store.get_taxonomy_tree(Some(category_id))).await?;
    match subtree.first() {
        None => return Err(AppError::NotFound("Category not found".to_string())),
        Some(node) if !node.children.is_empty() => {
            return Err(AppError::ValidationError(format!(
                "Category {} is not a leaf; model definitions apply to leaf categories only",
                category_id
            )));
        }
        Some(_) => {}
    }

    let store = state.result_store.clone();
    let engine = state.engine.clone();
    let saved = definition.clone();
    let report = blocking(move || {
        store.save_model_definition(&saved)?;
        engine.run(category_id)
    })
    .await?;

    tracing::info!(
        "Model definition saved for category {} ({} scores written)",
        category_id,
        report.anomalies_written
    );
    state.events.publish(MODEL_UPDATED, json!({ "category_id": category_id }));

    Ok(Json(definition))
}

/// Delete the definition and its anomaly results; records are kept
pub async fn delete(
    State(state): State<AppState>,
    Path(category_id): Path<NodeId>,
) -> AppResult<Json<Value>> {
    let store = state.result_store.clone();
    blocking(move || store.delete_model_definition(category_id)).await?;

    state.events.publish(MODEL_DELETED, json!({ "category_id": category_id }));
    Ok(Json(json!({ "category_id": category_id, "deleted": true })))
}
