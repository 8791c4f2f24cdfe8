//! Feature registry metadata for the model editor

use axum::Json;

use wearwatch_core::registry_info;

use crate::models::FeaturesResponse;

pub async fn list() -> Json<FeaturesResponse> {
    Json(FeaturesResponse { features: registry_info() })
}
