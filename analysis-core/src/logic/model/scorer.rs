//! Anomaly Scorer
//!
//! Trains an isolation forest on the baseline feature matrix and maps raw
//! margins of the full period onto a 0..1 score. The scale constants come
//! from the baseline's own margins, never from the batch being scored, so a
//! score does not move when unrelated points are added later.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTAMINATION, DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS, RANDOM_SEED,
};
use crate::logic::error::{AnalysisError, Result};
use super::isolation_forest::IsolationForest;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Expected outlier fraction; places the model's decision boundary.
///
/// Serialised as `"auto"` or a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Contamination {
    /// Boundary at isolation score 0.5
    Auto,
    /// Boundary at the `1 - f` quantile of baseline isolation scores
    Fraction(f64),
}

impl TryFrom<serde_json::Value> for Contamination {
    type Error = String;

    fn try_from(value: serde_json::Value) -> std::result::Result<Self, Self::Error> {
        match &value {
            serde_json::Value::String(s) if s == "auto" => Ok(Contamination::Auto),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Contamination::Fraction)
                .ok_or_else(|| format!("contamination out of range: {n}")),
            other => Err(format!("contamination must be \"auto\" or a number, got {other}")),
        }
    }
}

impl From<Contamination> for serde_json::Value {
    fn from(c: Contamination) -> Self {
        match c {
            Contamination::Auto => serde_json::Value::from("auto"),
            Contamination::Fraction(f) => serde_json::Value::from(f),
        }
    }
}

/// Partial override of ensemble parameters; unset fields fall back
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_samples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contamination: Option<Contamination>,
}

impl AnomalyParams {
    /// Fields set in `self` win over `base`
    pub fn merged_over(&self, base: &AnomalyParams) -> AnomalyParams {
        AnomalyParams {
            n_estimators: self.n_estimators.or(base.n_estimators),
            max_samples: self.max_samples.or(base.max_samples),
            contamination: self.contamination.or(base.contamination),
        }
    }

    /// Fill defaults and validate
    pub fn resolve(&self) -> Result<ForestSettings> {
        let settings = ForestSettings {
            n_estimators: self.n_estimators.unwrap_or(DEFAULT_N_ESTIMATORS),
            max_samples: self.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES),
            contamination: self
                .contamination
                .unwrap_or(Contamination::Fraction(DEFAULT_CONTAMINATION)),
            seed: RANDOM_SEED,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Fully resolved ensemble settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestSettings {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: Contamination,
    pub seed: u64,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination: Contamination::Fraction(DEFAULT_CONTAMINATION),
            seed: RANDOM_SEED,
        }
    }
}

impl ForestSettings {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(AnalysisError::InvalidAnomalyParams("n_estimators must be >= 1".into()));
        }
        if self.max_samples == 0 {
            return Err(AnalysisError::InvalidAnomalyParams("max_samples must be >= 1".into()));
        }
        if let Contamination::Fraction(f) = self.contamination {
            if !(f > 0.0 && f <= 0.5) {
                return Err(AnalysisError::InvalidAnomalyParams(format!(
                    "contamination must be in (0, 0.5], got {f}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Baseline-derived scale constants for the 0..1 mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginScale {
    /// Largest positive baseline margin (1.0 if none)
    pub pos_max: f64,
    /// Magnitude of the most negative baseline margin (1.0 if none)
    pub neg_min: f64,
}

impl MarginScale {
    pub fn from_baseline(margins: &[f64]) -> Self {
        let pos_max = margins.iter().copied().filter(|&r| r > 0.0).fold(None, |acc: Option<f64>, r| {
            Some(acc.map_or(r, |a| a.max(r)))
        });
        let neg_min = margins.iter().copied().filter(|&r| r < 0.0).fold(None, |acc: Option<f64>, r| {
            Some(acc.map_or(r, |a| a.min(r)))
        });

        Self {
            pos_max: pos_max.unwrap_or(1.0),
            neg_min: neg_min.map(f64::abs).unwrap_or(1.0),
        }
    }

    /// Zero margin maps to 0.5; output is clamped to [0, 1]
    pub fn normalize(&self, r: f64) -> f64 {
        let score = if r >= 0.0 {
            0.5 + 0.5 * r / self.pos_max
        } else {
            0.5 - 0.5 * r.abs() / self.neg_min
        };
        score.clamp(0.0, 1.0)
    }
}

/// A forest trained on a baseline, plus its calibrated boundary and scale
#[derive(Debug, Clone)]
pub struct BaselineModel {
    forest: IsolationForest,
    offset: f64,
    scale: MarginScale,
}

impl BaselineModel {
    /// Train on the baseline matrix (at least one row)
    pub fn train(baseline: ArrayView2<f64>, settings: &ForestSettings) -> Result<Self> {
        settings.validate()?;

        let forest = IsolationForest::fit(baseline, settings.n_estimators, settings.max_samples, settings.seed)?;
        let baseline_scores = forest.score_samples(baseline);

        let offset = match settings.contamination {
            Contamination::Auto => 0.5,
            Contamination::Fraction(f) => quantile(&baseline_scores, 1.0 - f),
        };

        let baseline_margins: Vec<f64> = baseline_scores.iter().map(|s| s - offset).collect();
        let scale = MarginScale::from_baseline(&baseline_margins);

        log::debug!(
            "Trained isolation forest: {} trees, {} samples/tree, offset {:.4}, scale +{:.4}/-{:.4}",
            forest.n_estimators(),
            forest.sample_size(),
            offset,
            scale.pos_max,
            scale.neg_min
        );

        Ok(Self { forest, offset, scale })
    }

    /// Raw margins: positive = more anomalous than the boundary
    pub fn margins(&self, data: ArrayView2<f64>) -> Vec<f64> {
        self.forest
            .score_samples(data)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// Normalised 0..1 scores, one per row of `data`
    pub fn score(&self, data: ArrayView2<f64>) -> Vec<f64> {
        self.margins(data)
            .into_iter()
            .map(|r| self.scale.normalize(r))
            .collect()
    }

    pub fn scale(&self) -> MarginScale {
        self.scale
    }
}

/// Train on `baseline` and score every row of `all_data`.
///
/// `params = None` uses the defaults.
pub fn train_and_score(
    baseline: ArrayView2<f64>,
    all_data: ArrayView2<f64>,
    params: Option<&AnomalyParams>,
) -> Result<Vec<f64>> {
    let settings = params.copied().unwrap_or_default().resolve()?;
    let model = BaselineModel::train(baseline, &settings)?;
    Ok(model.score(all_data))
}

/// Linear-interpolated quantile, `q` in [0, 1]
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::prelude::*;

    /// Box–Muller normal samples around `mean`
    fn normal_column(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen();
                mean + std * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
            })
            .collect()
    }

    fn as_matrix(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    #[test]
    fn test_outlier_scores_higher_than_normal_mean() {
        let normal = normal_column(200, 10.0, 0.3, 0);
        let mut all = normal.clone();
        all.push(1000.0);

        let scores = train_and_score(as_matrix(&normal).view(), as_matrix(&all).view(), None).unwrap();
        assert_eq!(scores.len(), 201);
        let normal_mean = scores[..200].iter().sum::<f64>() / 200.0;
        assert!(scores[200] > normal_mean);
    }

    #[test]
    fn test_scores_in_unit_range() {
        let normal = normal_column(200, 10.0, 0.3, 1);
        let mut all = normal.clone();
        all.extend([1000.0, -1000.0, 10.0]);

        for params in [None, Some(AnomalyParams { contamination: Some(Contamination::Auto), ..Default::default() })] {
            let scores = train_and_score(as_matrix(&normal).view(), as_matrix(&all).view(), params.as_ref()).unwrap();
            assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        }
    }

    #[test]
    fn test_deterministic() {
        let baseline = as_matrix(&[10.0, 11.0, 10.5, 10.8, 10.2]);
        let all = as_matrix(&[10.0, 11.0, 50.0]);
        let a = train_and_score(baseline.view(), all.view(), None).unwrap();
        let b = train_and_score(baseline.view(), all.view(), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_baseline_scored_against_itself_centres_near_half() {
        let baseline = as_matrix(&normal_column(500, 10.0, 0.3, 0));
        let scores = train_and_score(baseline.view(), baseline.view(), None).unwrap();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        assert!((0.35..=0.55).contains(&mean), "mean score {mean}");
    }

    #[test]
    fn test_contamination_sets_share_above_half() {
        let baseline = as_matrix(&normal_column(500, 10.0, 0.3, 3));
        let params = AnomalyParams {
            contamination: Some(Contamination::Fraction(0.05)),
            ..Default::default()
        };
        let scores = train_and_score(baseline.view(), baseline.view(), Some(&params)).unwrap();
        let ratio = scores.iter().filter(|&&s| s > 0.5).count() as f64 / scores.len() as f64;
        assert!((0.01..=0.15).contains(&ratio), "ratio {ratio}");

        let low = AnomalyParams { contamination: Some(Contamination::Fraction(0.01)), ..Default::default() };
        let high = AnomalyParams { contamination: Some(Contamination::Fraction(0.1)), ..Default::default() };
        let above = |p: &AnomalyParams| {
            train_and_score(baseline.view(), baseline.view(), Some(p))
                .unwrap()
                .iter()
                .filter(|&&s| s > 0.5)
                .count()
        };
        assert!(above(&high) > above(&low));
    }

    #[test]
    fn test_all_identical_data() {
        let baseline = Array2::from_elem((10, 1), 5.0);
        let all = Array2::from_elem((15, 1), 5.0);
        let scores = train_and_score(baseline.view(), all.view(), None).unwrap();
        assert_eq!(scores.len(), 15);
        assert!(scores.iter().all(|s| s.is_finite() && (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_single_point_baseline() {
        let baseline = as_matrix(&[7.0]);
        let all = as_matrix(&[7.0, 8.0, 100.0]);
        let scores = train_and_score(baseline.view(), all.view(), None).unwrap();
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_empty_baseline_rejected() {
        let baseline = Array2::<f64>::zeros((0, 1));
        let all = as_matrix(&[1.0]);
        assert!(matches!(
            train_and_score(baseline.view(), all.view(), None),
            Err(AnalysisError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_custom_params() {
        let baseline = as_matrix(&[10.0, 11.0, 10.5, 10.8, 10.2]);
        let all = as_matrix(&[10.0, 11.0, 50.0]);
        for params in [
            AnomalyParams { n_estimators: Some(50), ..Default::default() },
            AnomalyParams { max_samples: Some(3), ..Default::default() },
            AnomalyParams { n_estimators: Some(200), ..Default::default() },
        ] {
            let scores = train_and_score(baseline.view(), all.view(), Some(&params)).unwrap();
            assert_eq!(scores.len(), 3);
            assert!(scores.iter().all(|s| s.is_finite()));
        }

        let defaults = train_and_score(baseline.view(), all.view(), None).unwrap();
        let explicit = train_and_score(baseline.view(), all.view(), Some(&AnomalyParams::default())).unwrap();
        assert_eq!(defaults, explicit);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = [
            AnomalyParams { n_estimators: Some(0), ..Default::default() },
            AnomalyParams { max_samples: Some(0), ..Default::default() },
            AnomalyParams { contamination: Some(Contamination::Fraction(0.7)), ..Default::default() },
            AnomalyParams { contamination: Some(Contamination::Fraction(0.0)), ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(params.resolve(), Err(AnalysisError::InvalidAnomalyParams(_))));
        }
    }

    #[test]
    fn test_scale_from_baseline_not_batch() {
        let scale = MarginScale::from_baseline(&[-0.2, -0.1, 0.05, 0.1]);
        assert_eq!(scale, MarginScale { pos_max: 0.1, neg_min: 0.2 });
        assert_eq!(scale.normalize(0.0), 0.5);
        assert_eq!(scale.normalize(0.1), 1.0);
        assert_eq!(scale.normalize(-0.1), 0.25);
        assert_eq!(scale.normalize(5.0), 1.0);
        assert_eq!(scale.normalize(-5.0), 0.0);

        // no positive / no negative margins fall back to 1.0
        let flat = MarginScale::from_baseline(&[0.0, 0.0]);
        assert_eq!(flat, MarginScale { pos_max: 1.0, neg_min: 1.0 });
    }

    #[test]
    fn test_params_json() {
        let params: AnomalyParams = serde_json::from_str(r#"{"contamination":"auto","n_estimators":50}"#).unwrap();
        assert_eq!(params.contamination, Some(Contamination::Auto));
        assert_eq!(params.n_estimators, Some(50));
        assert_eq!(params.max_samples, None);

        let numeric: AnomalyParams = serde_json::from_str(r#"{"contamination":0.1}"#).unwrap();
        assert_eq!(numeric.contamination, Some(Contamination::Fraction(0.1)));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), r#"{"contamination":0.1}"#);

        assert!(serde_json::from_str::<AnomalyParams>(r#"{"contamination":"lots"}"#).is_err());
    }

    #[test]
    fn test_merge_prefers_override() {
        let base = AnomalyParams { n_estimators: Some(100), max_samples: Some(64), contamination: None };
        let over = AnomalyParams { n_estimators: Some(10), ..Default::default() };
        let merged = over.merged_over(&base);
        assert_eq!(merged.n_estimators, Some(10));
        assert_eq!(merged.max_samples, Some(64));
        assert_eq!(merged.contamination, None);
    }
}
