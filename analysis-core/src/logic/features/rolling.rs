//! Trailing-window features: moving average and moving standard deviation
//!
//! Positions before the window is full are zero-padded.

use chrono::NaiveDateTime;

use crate::constants::DEFAULT_FEATURE_WINDOW;
use crate::logic::error::Result;
use super::builder::{column, FeatureBuilder, FeatureMatrix};

/// Apply `stat` to every full trailing window, zero before that
fn trailing(values: &[f64], window: usize, stat: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                0.0
            } else {
                stat(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Population standard deviation
fn std_dev(window: &[f64]) -> f64 {
    let m = mean(window);
    let variance = window.iter().map(|v| (v - m).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}

/// Trailing mean over the `window` most recent points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    /// `window` must be >= 1 (the registry validates user input)
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_WINDOW)
    }
}

impl FeatureBuilder for MovingAverage {
    fn name(&self) -> &str {
        "moving_avg"
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn compute(&self, values: &[f64], _timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        Ok(column(trailing(values, self.window, mean)))
    }
}

/// Trailing population standard deviation over the `window` most recent points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingStd {
    window: usize,
}

impl MovingStd {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for MovingStd {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_WINDOW)
    }
}

impl FeatureBuilder for MovingStd {
    fn name(&self) -> &str {
        "moving_std"
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn compute(&self, values: &[f64], _timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        Ok(column(trailing(values, self.window, std_dev)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_avg_basic() {
        let m = MovingAverage::new(3).build(&[10.0, 20.0, 30.0, 40.0, 50.0], None).unwrap();
        assert_eq!(m.dim(), (5, 1));
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m[[1, 0]], 0.0);
        assert!((m[[2, 0]] - 20.0).abs() < 1e-12);
        assert!((m[[3, 0]] - 30.0).abs() < 1e-12);
        assert!((m[[4, 0]] - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_moving_avg_default_window_is_5() {
        let m = MovingAverage::default().build(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], None).unwrap();
        assert_eq!(m.dim(), (6, 1));
        assert_eq!(m[[3, 0]], 0.0);
        assert!((m[[4, 0]] - 3.0).abs() < 1e-12);
        assert!((m[[5, 0]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_longer_than_series() {
        let m = MovingAverage::new(10).build(&[1.0, 2.0], None).unwrap();
        assert_eq!(m.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_moving_std_constant_is_zero() {
        let m = MovingStd::new(3).build(&[5.0, 5.0, 5.0, 5.0], None).unwrap();
        assert_eq!(m[[2, 0]], 0.0);
        assert_eq!(m[[3, 0]], 0.0);
    }

    #[test]
    fn test_moving_std_population() {
        let m = MovingStd::new(3).build(&[10.0, 20.0, 30.0], None).unwrap();
        // population std of [10, 20, 30] = sqrt(200 / 3)
        let expected = (200.0f64 / 3.0).sqrt();
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m[[1, 0]], 0.0);
        assert!((m[[2, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(MovingAverage::default().build(&[], None).unwrap().dim(), (0, 1));
        assert_eq!(MovingStd::default().build(&[], None).unwrap().dim(), (0, 1));
    }
}
