use crate::logic::error::{AnalysisError, Result};
use crate::logic::features::create_feature_builder;
use super::types::ModelDefinition;

/// Validate a definition before it is persisted.
///
/// Checks the window order, the sensitivity range, and that the feature config
/// and anomaly parameters would actually construct.
pub fn validate_definition(def: &ModelDefinition) -> Result<()> {
    if def.baseline_start > def.baseline_end {
        return Err(AnalysisError::InvalidModelDefinition(format!(
            "baseline_start {} is after baseline_end {}",
            def.baseline_start, def.baseline_end
        )));
    }

    if !(0.0..=1.0).contains(&def.sensitivity) {
        return Err(AnalysisError::InvalidModelDefinition(format!(
            "sensitivity must be within [0, 1], got {}",
            def.sensitivity
        )));
    }

    if let Some(config) = &def.feature_config {
        create_feature_builder(config)?;
    }

    if let Some(params) = &def.anomaly_params {
        params.resolve()?;
    }

    Ok(())
}
