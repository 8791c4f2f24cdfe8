//! Trend Estimator
//!
//! Ordinary least squares through (1..=n, value). A slope above the warning
//! threshold flags the node as degrading.

use serde::{Deserialize, Serialize};

/// Fitted line `value = slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub is_warning: bool,
}

/// Closed-form OLS over ordinal indices 1..=n.
///
/// A single point gives slope 0 and the value as intercept. An empty slice
/// gives an all-zero fit; the engine never calls it that way.
pub fn compute_trend(values: &[f64], warning_threshold: f64) -> TrendFit {
    let n = values.len();
    if n == 0 {
        return TrendFit { slope: 0.0, intercept: 0.0, is_warning: false };
    }

    let nf = n as f64;
    let mean_x = (nf + 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let (sxy, sxx) = values.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
        let dx = (i + 1) as f64 - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    TrendFit {
        slope,
        intercept,
        is_warning: slope > warning_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WARNING_THRESHOLD;

    #[test]
    fn test_increasing_values_positive_slope() {
        let fit = compute_trend(&[1.0, 2.0, 3.0, 4.0, 5.0], WARNING_THRESHOLD);
        assert!((fit.slope - 1.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!(fit.is_warning);
    }

    #[test]
    fn test_constant_values_flat() {
        let fit = compute_trend(&[100.0; 6], WARNING_THRESHOLD);
        assert!(fit.slope.abs() < 1e-9);
        assert!((fit.intercept - 100.0).abs() < 1e-9);
        assert!(!fit.is_warning);
    }

    #[test]
    fn test_single_point() {
        let fit = compute_trend(&[42.0], WARNING_THRESHOLD);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 42.0);
        assert!(!fit.is_warning);
    }

    #[test]
    fn test_warning_is_strictly_greater() {
        // slope exactly 0.5
        let at = compute_trend(&[0.0, 0.5, 1.0, 1.5], 0.5);
        assert!((at.slope - 0.5).abs() < 1e-12);
        assert_eq!(at.is_warning, at.slope > 0.5);

        let below = compute_trend(&[10.0, 10.3, 10.6], 0.5);
        assert!(!below.is_warning);

        let above = compute_trend(&[10.0, 11.0, 12.0], 0.5);
        assert!(above.is_warning);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let values = [10.0, 10.3, 10.6];
        assert!(!compute_trend(&values, 0.5).is_warning);
        assert!(compute_trend(&values, 0.1).is_warning);
    }

    #[test]
    fn test_matches_closed_form_on_noisy_data() {
        // y = 2x + 1 with symmetric noise
        let values = [3.5, 4.5, 7.5, 8.5];
        let fit = compute_trend(&values, WARNING_THRESHOLD);
        assert!((fit.slope - 1.8).abs() < 1e-12);
        assert!((fit.intercept - 1.5).abs() < 1e-12);
    }
}
