//! Model definition, result and taxonomy models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use wearwatch_core::logic::features::FeatureInfo;
use wearwatch_core::logic::records::{flexible_timestamp, flexible_timestamp_vec};
use wearwatch_core::{
    AnomalyParams, AnomalyResult, FeatureConfig, ModelDefinition, NodeId, TaxonomyNode, TrendResult,
};

/// PUT body for `/api/models/:category_id`; the id comes from the path
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModelDefinitionRequest {
    #[serde(with = "flexible_timestamp")]
    pub baseline_start: NaiveDateTime,

    #[serde(with = "flexible_timestamp")]
    pub baseline_end: NaiveDateTime,

    #[validate(range(min = 0.0, max = 1.0, message = "sensitivity must be within [0, 1]"))]
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    #[serde(default, with = "flexible_timestamp_vec")]
    pub excluded_points: Vec<NaiveDateTime>,

    #[serde(default)]
    pub feature_config: Option<FeatureConfig>,

    #[serde(default)]
    pub anomaly_params: Option<AnomalyParams>,
}

fn default_sensitivity() -> f64 {
    0.5
}

impl ModelDefinitionRequest {
    pub fn into_definition(self, category_id: NodeId) -> ModelDefinition {
        ModelDefinition {
            category_id,
            baseline_start: self.baseline_start,
            baseline_end: self.baseline_end,
            sensitivity: self.sensitivity,
            excluded_points: self.excluded_points,
            feature_config: self.feature_config,
            anomaly_params: self.anomaly_params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub category_id: NodeId,
    pub trend: Option<TrendResult>,
    pub anomalies: Vec<AnomalyResult>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisRunResponse {
    pub processed: usize,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub root: Option<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<TaxonomyNode>,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub features: Vec<FeatureInfo>,
}
