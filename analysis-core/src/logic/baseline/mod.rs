//! Baseline Module - Known-normal window selection
//!
//! Picks the measurements an anomaly model is trained on: the inclusive
//! `[baseline_start, baseline_end]` window minus excluded points.
//!
//! # Architecture
//! - `types.rs`: `ModelDefinition`
//! - `validate.rs`: definition checks before persisting
//!
//! # Failure Strategy
//! An empty selection is not an error: the engine skips anomaly scoring and
//! keeps the trend result.

pub mod types;
pub mod validate;
#[cfg(test)]
mod tests;

use std::collections::HashSet;
use chrono::NaiveDateTime;

use crate::logic::records::Measurement;

pub use types::ModelDefinition;
pub use validate::validate_definition;

/// Baseline subset of `records`, preserving their order.
///
/// Exclusion compares naive timestamps exactly.
pub fn select_baseline<'a>(records: &'a [Measurement], def: &ModelDefinition) -> Vec<&'a Measurement> {
    let excluded: HashSet<&NaiveDateTime> = def.excluded_points.iter().collect();

    records
        .iter()
        .filter(|m| def.in_window(&m.recorded_at))
        .filter(|m| !excluded.contains(&m.recorded_at))
        .collect()
}
