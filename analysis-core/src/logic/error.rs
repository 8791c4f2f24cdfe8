//! Error types for the analysis pipeline and its stores

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures surfaced by the analysis pipeline.
///
/// Contract violations (bad shapes, unknown feature types, bad parameters)
/// are never coerced; expected absences (no records, no model definition,
/// empty baseline) are not errors and never reach this type.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(
        "feature builder '{builder}' returned a {rows}x{cols} matrix, expected {expected_rows}x{expected_cols}"
    )]
    InvalidFeatureShape {
        builder: String,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("got {values} values but {timestamps} timestamps")]
    TimestampLengthMismatch { values: usize, timestamps: usize },

    #[error("At least one builder is required for a composite feature")]
    EmptyComposite,

    #[error("Unknown feature type: {0}")]
    UnknownFeatureType(String),

    #[error("invalid parameter '{param}' for feature '{feature}': {reason}")]
    InvalidFeatureParam {
        feature: String,
        param: String,
        reason: String,
    },

    #[error("invalid anomaly parameters: {0}")]
    InvalidAnomalyParams(String),

    #[error("anomaly model needs at least one baseline row")]
    EmptyTrainingSet,

    #[error("category path must contain at least one non-empty name")]
    InvalidCategoryPath,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid model definition: {0}")]
    InvalidModelDefinition(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence failures from a data or result store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for AnalysisError {
    fn from(err: rusqlite::Error) -> Self {
        AnalysisError::Store(StoreError::Sqlite(err))
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Store(StoreError::Serialization(err))
    }
}

impl AnalysisError {
    /// True for caller mistakes (bad config or input) as opposed to store failures
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, AnalysisError::Store(_))
    }
}
