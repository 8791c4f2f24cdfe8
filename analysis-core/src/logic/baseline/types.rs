use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureConfig;
use crate::logic::model::AnomalyParams;
use crate::logic::records::{flexible_timestamp, flexible_timestamp_vec, NodeId};

// ============================================================================
// MODEL DEFINITION
// ============================================================================

/// Per-leaf anomaly model configuration, one per node.
///
/// Deleting a definition removes the node's anomaly results, never its
/// measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub category_id: NodeId,

    /// Baseline window, both ends inclusive
    #[serde(with = "flexible_timestamp")]
    pub baseline_start: NaiveDateTime,
    #[serde(with = "flexible_timestamp")]
    pub baseline_end: NaiveDateTime,

    /// Display threshold for the 0..1 score; stored for the consumer only
    pub sensitivity: f64,

    /// Points inside the window to leave out of training (maintenance etc.)
    #[serde(default, with = "flexible_timestamp_vec")]
    pub excluded_points: Vec<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_config: Option<FeatureConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_params: Option<AnomalyParams>,
}

impl ModelDefinition {
    pub fn new(
        category_id: NodeId,
        baseline_start: NaiveDateTime,
        baseline_end: NaiveDateTime,
        sensitivity: f64,
    ) -> Self {
        Self {
            category_id,
            baseline_start,
            baseline_end,
            sensitivity,
            excluded_points: Vec::new(),
            feature_config: None,
            anomaly_params: None,
        }
    }

    pub fn with_excluded(mut self, points: Vec<NaiveDateTime>) -> Self {
        self.excluded_points = points;
        self
    }

    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.feature_config = Some(config);
        self
    }

    pub fn with_anomaly_params(mut self, params: AnomalyParams) -> Self {
        self.anomaly_params = Some(params);
        self
    }

    /// Inclusive window check
    pub fn in_window(&self, ts: &NaiveDateTime) -> bool {
        self.baseline_start <= *ts && *ts <= self.baseline_end
    }
}
