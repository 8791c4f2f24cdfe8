//! FeatureBuilder - core contract for ML input
//!
//! A builder turns a work-time series (optionally with timestamps) into a
//! `(n, d)` feature matrix. Implementors provide `compute`; callers always go
//! through `build`, which checks the input lengths and the output shape.

use std::fmt;
use chrono::NaiveDateTime;
use ndarray::Array2;

use crate::logic::error::{AnalysisError, Result};

/// Feature matrix: rows = samples, columns = feature dimensions
pub type FeatureMatrix = Array2<f64>;

/// Trait for feature builders
pub trait FeatureBuilder: fmt::Debug + Send + Sync {
    /// Registry identifier of this builder ("composite" for composites)
    fn name(&self) -> &str;

    /// Natural column count `d` of the output
    fn dimensions(&self) -> usize;

    /// Type-specific computation. Must return exactly `values.len()` rows and
    /// `dimensions()` columns.
    fn compute(&self, values: &[f64], timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix>;

    /// Build the feature matrix and enforce the `(n, d)` postcondition.
    ///
    /// Empty input yields shape `(0, d)`.
    fn build(&self, values: &[f64], timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        if let Some(ts) = timestamps {
            if ts.len() != values.len() {
                return Err(AnalysisError::TimestampLengthMismatch {
                    values: values.len(),
                    timestamps: ts.len(),
                });
            }
        }

        let matrix = self.compute(values, timestamps)?;
        check_shape(self.name(), &matrix, values.len(), self.dimensions())?;
        Ok(matrix)
    }
}

/// Verify a matrix is exactly `rows x cols`
pub fn check_shape(builder: &str, matrix: &FeatureMatrix, rows: usize, cols: usize) -> Result<()> {
    let (actual_rows, actual_cols) = matrix.dim();
    if actual_rows != rows || actual_cols != cols {
        return Err(AnalysisError::InvalidFeatureShape {
            builder: builder.to_string(),
            expected_rows: rows,
            expected_cols: cols,
            rows: actual_rows,
            cols: actual_cols,
        });
    }
    Ok(())
}

/// Single-column matrix from a series
pub fn column(series: Vec<f64>) -> FeatureMatrix {
    let n = series.len();
    Array2::from_shape_fn((n, 1), |(i, _)| series[i])
}
