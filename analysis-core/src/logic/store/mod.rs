//! Store Module - Data & Result Store Contracts
//!
//! - `DataStore`: taxonomy and raw measurements (written by ingestion)
//! - `ResultStore`: trend/anomaly results and model definitions
//!
//! Implementations:
//! - `memory.rs` - `RwLock`-guarded maps for tests and embedders
//! - `sqlite.rs` - rusqlite-backed persistent stores

pub mod memory;
pub mod sqlite;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::logic::baseline::ModelDefinition;
use crate::logic::error::Result;
use crate::logic::records::{flexible_timestamp, Measurement, NodeId};
use crate::logic::taxonomy::TaxonomyNode;

pub use memory::{MemoryDataStore, MemoryResultStore};
pub use sqlite::{SqliteDataStore, SqliteResultStore};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Trend for one node; overwritten on every run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub category_id: NodeId,
    pub slope: f64,
    pub intercept: f64,
    pub is_warning: bool,
}

/// Score for one (node, timestamp); 0..1, higher is more anomalous
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub category_id: NodeId,
    #[serde(with = "flexible_timestamp")]
    pub recorded_at: NaiveDateTime,
    pub anomaly_score: f64,
}

// ============================================================================
// CONTRACTS
// ============================================================================

/// Taxonomy and raw work-time records
pub trait DataStore: Send + Sync {
    /// Insert or overwrite on (node, timestamp); returns the count written
    fn upsert_records(&self, records: &[Measurement]) -> Result<usize>;

    /// Get-or-create every node along `path` from a root; returns the last id
    fn ensure_category_path(&self, path: &[String]) -> Result<NodeId>;

    /// Records of one node, ascending by time, bounds inclusive
    fn get_records(
        &self,
        category_id: NodeId,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>>;

    /// All root trees, or the subtree under `root` (empty if unknown)
    fn get_taxonomy_tree(&self, root: Option<NodeId>) -> Result<Vec<TaxonomyNode>>;

    fn delete_all_data(&self) -> Result<()>;
}

/// Analysis output and per-node model definitions
pub trait ResultStore: Send + Sync {
    /// Upsert by node
    fn save_trend_result(&self, result: &TrendResult) -> Result<()>;

    fn get_trend_result(&self, category_id: NodeId) -> Result<Option<TrendResult>>;

    /// Upsert by (node, timestamp)
    fn save_anomaly_results(&self, results: &[AnomalyResult]) -> Result<()>;

    /// Ordered by timestamp
    fn get_anomaly_results(&self, category_id: NodeId) -> Result<Vec<AnomalyResult>>;

    /// Upsert by node
    fn save_model_definition(&self, definition: &ModelDefinition) -> Result<()>;

    fn get_model_definition(&self, category_id: NodeId) -> Result<Option<ModelDefinition>>;

    /// Also removes the node's anomaly results. Missing definition is fine.
    fn delete_model_definition(&self, category_id: NodeId) -> Result<()>;

    fn delete_anomaly_results(&self, category_id: NodeId) -> Result<()>;

    fn delete_all_data(&self) -> Result<()>;
}

/// Trim each segment; an empty path or a blank segment is rejected
pub(crate) fn normalize_path(path: &[String]) -> Result<Vec<String>> {
    use crate::logic::error::AnalysisError;

    if path.is_empty() {
        return Err(AnalysisError::InvalidCategoryPath);
    }
    path.iter()
        .map(|segment| {
            let trimmed = segment.trim();
            if trimmed.is_empty() {
                Err(AnalysisError::InvalidCategoryPath)
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}
