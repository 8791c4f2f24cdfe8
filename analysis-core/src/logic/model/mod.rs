//! Model Module - Baseline Anomaly Scoring
//!
//! - `isolation_forest.rs` - seeded isolation forest (fit / score_samples)
//! - `scorer.rs` - parameters, boundary calibration and 0..1 normalisation

pub mod isolation_forest;
pub mod scorer;

pub use isolation_forest::IsolationForest;
pub use scorer::{
    train_and_score, AnomalyParams, BaselineModel, Contamination, ForestSettings, MarginScale,
};
