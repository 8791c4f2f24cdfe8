//! Manual analysis trigger

use axum::{extract::State, Json};
use serde_json::json;

use crate::events::ANALYSIS_COMPLETED;
use crate::models::AnalysisRunResponse;
use crate::{AppResult, AppState};
use super::blocking;

/// Run every taxonomy leaf
pub async fn run_all(State(state): State<AppState>) -> AppResult<Json<AnalysisRunResponse>> {
    let engine = state.engine.clone();
    let processed = blocking(move || engine.run_all()).await?;

    state.events.publish(ANALYSIS_COMPLETED, json!({ "processed": processed }));
    Ok(Json(AnalysisRunResponse { processed }))
}
