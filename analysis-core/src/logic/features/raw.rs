//! Raw and first-difference features (d = 1)

use chrono::NaiveDateTime;

use crate::logic::error::Result;
use super::builder::{column, FeatureBuilder, FeatureMatrix};

/// Raw work time, unchanged. The default feature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawWorkTime;

impl RawWorkTime {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureBuilder for RawWorkTime {
    fn name(&self) -> &str {
        "raw_work_time"
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn compute(&self, values: &[f64], _timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        Ok(column(values.to_vec()))
    }
}

/// First difference; the first row is 0 ("no change yet")
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Diff;

impl Diff {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureBuilder for Diff {
    fn name(&self) -> &str {
        "diff"
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn compute(&self, values: &[f64], _timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        let mut out = Vec::with_capacity(values.len());
        if !values.is_empty() {
            out.push(0.0);
        }
        out.extend(values.windows(2).map(|w| w[1] - w[0]));
        Ok(column(out))
    }
}
