//! Central Configuration Constants
//!
//! Single source of truth for analysis defaults.
//! Policy values (trend warning, ensemble defaults) are only edited here.

/// Slope above which a trend is flagged as a warning.
///
/// Provisional policy value, not calibrated against equipment data.
/// Override through `EngineConfig::warning_threshold`.
pub const WARNING_THRESHOLD: f64 = 0.5;

/// Default trailing window for moving average / moving std features
pub const DEFAULT_FEATURE_WINDOW: usize = 5;

/// Default number of isolation trees
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default per-tree subsample size (capped by the baseline size)
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Default expected outlier fraction.
///
/// Places the decision boundary at the baseline median, so baseline-like
/// data scores around 0.5.
pub const DEFAULT_CONTAMINATION: f64 = 0.5;

/// Fixed RNG seed: identical inputs must give bit-identical scores
pub const RANDOM_SEED: u64 = 42;

/// Storage format for naive timestamps (lexically sortable)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// App name
pub const APP_NAME: &str = "wearwatch";
