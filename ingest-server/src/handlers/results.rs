//! Analysis results handler

use axum::{extract::{Path, State}, Json};

use wearwatch_core::NodeId;

use crate::models::ResultsResponse;
use crate::{AppResult, AppState};
use super::blocking;

/// Trend and per-timestamp scores for a category
pub async fn get(
    State(state): State<AppState>,
    Path(category_id): Path<NodeId>,
) -> AppResult<Json<ResultsResponse>> {
    let store = state.result_store.clone();
    let (trend, anomalies) = blocking(move || {
        Ok((store.get_trend_result(category_id)?, store.get_anomaly_results(category_id)?))
    })
    .await?;

    Ok(Json(ResultsResponse { category_id, trend, anomalies }))
}
