//! Features Module - Feature Extraction Engine
//!
//! Turns a work-time series into the feature matrix consumed by the anomaly
//! model. New feature kinds are added in `registry.rs` without touching the
//! engine.

pub mod builder;
pub mod composite;
pub mod raw;
pub mod registry;
pub mod rolling;


// Re-export common types
pub use builder::{FeatureBuilder, FeatureMatrix};
pub use composite::Composite;
pub use raw::{Diff, RawWorkTime};
pub use registry::{
    create_feature_builder, registry_info, FeatureConfig, FeatureInfo, FeatureKind, FeatureSpec,
    FEATURE_REGISTRY,
};
pub use rolling::{MovingAverage, MovingStd};
