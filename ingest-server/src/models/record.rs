//! Record ingestion models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use wearwatch_core::logic::records::flexible_timestamp;
use wearwatch_core::{Measurement, NodeId};

use crate::{AppError, AppResult};

/// One record in a JSON batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordItem {
    #[validate(length(min = 1, message = "category_path must not be empty"))]
    pub category_path: Vec<String>,

    #[validate(range(min = 0.0, message = "work_time must be a non-negative number"))]
    pub work_time: f64,

    #[serde(with = "flexible_timestamp")]
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordsBatchRequest {
    #[validate(nested)]
    pub records: Vec<RecordItem>,
}

/// `category,work_time,recorded_at` row; `category` may be `a/b/c`
#[derive(Debug, Deserialize)]
pub struct CsvRow {
    pub category: String,
    pub work_time: f64,
    pub recorded_at: String,
}

impl CsvRow {
    /// `line` is 1-based and counts the header
    pub fn into_item(self, line: usize) -> AppResult<RecordItem> {
        if !self.work_time.is_finite() || self.work_time < 0.0 {
            return Err(AppError::ValidationError(format!(
                "line {}: work_time must be a non-negative number",
                line
            )));
        }

        let recorded_at = wearwatch_core::parse_timestamp(&self.recorded_at)
            .map_err(|e| AppError::ValidationError(format!("line {}: {}", line, e)))?;

        Ok(RecordItem {
            category_path: split_category(&self.category),
            work_time: self.work_time,
            recorded_at,
        })
    }
}

/// Split a `/`-separated category into path segments
pub fn split_category(raw: &str) -> Vec<String> {
    raw.split('/').map(|s| s.trim().to_string()).collect()
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub inserted: usize,
    pub category_ids: Vec<NodeId>,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub category_id: NodeId,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<Measurement>,
}
