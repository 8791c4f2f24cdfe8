//! wearwatch core - equipment work-time degradation analysis
//!
//! Per taxonomy leaf: a least-squares trend over the full history and a
//! 0..1 anomaly score per measurement, calibrated against a user-chosen
//! baseline window.

pub mod constants;
pub mod logic;

pub use logic::baseline::{select_baseline, validate_definition, ModelDefinition};
pub use logic::engine::{AnalysisEngine, EngineConfig, RunReport, RunStage};
pub use logic::error::{AnalysisError, Result, StoreError};
pub use logic::features::{create_feature_builder, registry_info, FeatureBuilder, FeatureConfig, FeatureSpec};
pub use logic::model::{train_and_score, AnomalyParams, Contamination};
pub use logic::records::{parse_timestamp, Measurement, NodeId};
pub use logic::store::{
    AnomalyResult, DataStore, MemoryDataStore, MemoryResultStore, ResultStore, SqliteDataStore,
    SqliteResultStore, TrendResult,
};
pub use logic::taxonomy::{collect_leaves, TaxonomyNode};
pub use logic::trend::{compute_trend, TrendFit};
