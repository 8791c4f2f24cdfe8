//! Analysis Engine - trend + baseline anomaly orchestration
//!
//! `run(node)` per leaf:
//! 1. records (none -> no-op)
//! 2. sort, trend, save trend
//! 3. model definition (none -> trend only)
//! 4. baseline window minus exclusions (empty -> trend only)
//! 5-7. features, score, save one result per record
//!
//! Stores are injected; the engine holds no global state.

use std::sync::Arc;
use chrono::NaiveDateTime;

use crate::constants::WARNING_THRESHOLD;
use crate::logic::baseline::select_baseline;
use crate::logic::error::Result;
use crate::logic::features::{create_feature_builder, FeatureBuilder, RawWorkTime};
use crate::logic::model::{train_and_score, AnomalyParams};
use crate::logic::records::{sort_by_time, NodeId};
use crate::logic::store::{AnomalyResult, DataStore, ResultStore, TrendResult};
use crate::logic::taxonomy::collect_leaves;
use crate::logic::trend::compute_trend;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Trend slope above which `is_warning` is set
    pub warning_threshold: f64,
    /// Base ensemble parameters; a definition's own params are merged over these
    pub default_anomaly_params: AnomalyParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warning_threshold: WARNING_THRESHOLD,
            default_anomaly_params: AnomalyParams::default(),
        }
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

/// Where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    NoRecords,
    NoModelDefinition,
    EmptyBaseline,
    Scored,
}

/// What a single `run` wrote
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub category_id: NodeId,
    pub records: usize,
    pub trend: Option<TrendResult>,
    pub anomalies_written: usize,
    pub stage: RunStage,
}

impl RunReport {
    fn stopped(category_id: NodeId, records: usize, trend: Option<TrendResult>, stage: RunStage) -> Self {
        Self { category_id, records, trend, anomalies_written: 0, stage }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AnalysisEngine {
    data_store: Arc<dyn DataStore>,
    result_store: Arc<dyn ResultStore>,
    config: EngineConfig,
    /// Used when a definition carries no feature config
    default_builder: Box<dyn FeatureBuilder>,
}

impl AnalysisEngine {
    pub fn new(data_store: Arc<dyn DataStore>, result_store: Arc<dyn ResultStore>, config: EngineConfig) -> Self {
        Self {
            data_store,
            result_store,
            config,
            default_builder: Box::new(RawWorkTime),
        }
    }

    /// Replace the fallback builder (raw work time by default)
    pub fn with_default_builder(mut self, builder: Box<dyn FeatureBuilder>) -> Self {
        self.default_builder = builder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyse one node. Expected absences end the run early without error.
    pub fn run(&self, category_id: NodeId) -> Result<RunReport> {
        let mut records = self.data_store.get_records(category_id, None, None)?;
        if records.is_empty() {
            log::debug!("Category {}: no records, skipping", category_id);
            return Ok(RunReport::stopped(category_id, 0, None, RunStage::NoRecords));
        }

        sort_by_time(&mut records);
        let values: Vec<f64> = records.iter().map(|r| r.work_time).collect();

        let fit = compute_trend(&values, self.config.warning_threshold);
        let trend = TrendResult {
            category_id,
            slope: fit.slope,
            intercept: fit.intercept,
            is_warning: fit.is_warning,
        };
        self.result_store.save_trend_result(&trend)?;

        let Some(definition) = self.result_store.get_model_definition(category_id)? else {
            log::debug!("Category {}: no model definition, trend only", category_id);
            return Ok(RunReport::stopped(category_id, records.len(), Some(trend), RunStage::NoModelDefinition));
        };

        let baseline = select_baseline(&records, &definition);
        if baseline.is_empty() {
            log::debug!(
                "Category {}: baseline {} .. {} is empty after {} exclusions, skipping scores",
                category_id,
                definition.baseline_start,
                definition.baseline_end,
                definition.excluded_points.len()
            );
            return Ok(RunReport::stopped(category_id, records.len(), Some(trend), RunStage::EmptyBaseline));
        }

        let configured;
        let builder: &dyn FeatureBuilder = match &definition.feature_config {
            Some(config) => {
                configured = create_feature_builder(config)?;
                configured.as_ref()
            }
            None => self.default_builder.as_ref(),
        };

        let baseline_values: Vec<f64> = baseline.iter().map(|m| m.work_time).collect();
        let baseline_ts: Vec<NaiveDateTime> = baseline.iter().map(|m| m.recorded_at).collect();
        let all_ts: Vec<NaiveDateTime> = records.iter().map(|m| m.recorded_at).collect();

        let baseline_features = builder.build(&baseline_values, Some(&baseline_ts))?;
        let all_features = builder.build(&values, Some(&all_ts))?;

        let params = definition
            .anomaly_params
            .unwrap_or_default()
            .merged_over(&self.config.default_anomaly_params);
        let scores = train_and_score(baseline_features.view(), all_features.view(), Some(&params))?;

        let results: Vec<AnomalyResult> = records
            .iter()
            .zip(scores)
            .map(|(m, anomaly_score)| AnomalyResult {
                category_id,
                recorded_at: m.recorded_at,
                anomaly_score,
            })
            .collect();
        self.result_store.save_anomaly_results(&results)?;

        log::info!(
            "Category {}: {} records, slope {:.4}{}, {} scores ({} baseline, {} features)",
            category_id,
            records.len(),
            trend.slope,
            if trend.is_warning { " [warning]" } else { "" },
            results.len(),
            baseline.len(),
            builder.dimensions()
        );

        Ok(RunReport {
            category_id,
            records: records.len(),
            trend: Some(trend),
            anomalies_written: results.len(),
            stage: RunStage::Scored,
        })
    }

    /// Run every taxonomy leaf; returns the number of leaves processed
    pub fn run_all(&self) -> Result<usize> {
        let tree = self.data_store.get_taxonomy_tree(None)?;
        let leaves = collect_leaves(&tree);

        for leaf in &leaves {
            self.run(leaf.id)?;
        }

        log::info!("Analysis completed for {} leaf categories", leaves.len());
        Ok(leaves.len())
    }
}
