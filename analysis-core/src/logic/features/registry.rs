//! Feature Registry & Factory
//!
//! Static table mapping a feature-type identifier to its constructor and
//! UI-facing metadata. The table is the single source of truth for both;
//! adding a feature means adding a `FeatureKind` variant and one entry.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FEATURE_WINDOW;
use crate::logic::error::{AnalysisError, Result};
use super::builder::FeatureBuilder;
use super::composite::Composite;
use super::raw::{Diff, RawWorkTime};
use super::rolling::{MovingAverage, MovingStd};

// ============================================================================
// CONFIG VALUES
// ============================================================================

/// One requested feature: identifier plus parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub feature_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl FeatureSpec {
    pub fn new(feature_type: &str) -> Self {
        Self {
            feature_type: feature_type.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

/// Ordered feature selection. Empty means "raw work time only".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

impl FeatureConfig {
    pub fn new(features: Vec<FeatureSpec>) -> Self {
        Self { features }
    }

    pub fn is_default(&self) -> bool {
        self.features.is_empty()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Closed set of known feature kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    RawWorkTime,
    Diff,
    MovingAvg,
    MovingStd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
}

/// Parameter schema entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSchema {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: i64,
    pub min: i64,
    pub description: &'static str,
}

/// Validated parameter values, keyed by schema name
pub type ParamValues = BTreeMap<&'static str, i64>;

/// Registry entry
#[derive(Clone, Copy)]
pub struct FeatureEntry {
    pub kind: FeatureKind,
    pub feature_type: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSchema],
    construct: fn(&ParamValues) -> Box<dyn FeatureBuilder>,
}

impl std::fmt::Debug for FeatureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEntry")
            .field("kind", &self.kind)
            .field("feature_type", &self.feature_type)
            .finish()
    }
}

const WINDOW_PARAM: &[ParamSchema] = &[ParamSchema {
    name: "window",
    kind: ParamKind::Integer,
    default: DEFAULT_FEATURE_WINDOW as i64,
    min: 1,
    description: "Number of most recent points in the trailing window",
}];

fn window_of(params: &ParamValues) -> usize {
    params
        .get("window")
        .map(|&w| w as usize)
        .unwrap_or(DEFAULT_FEATURE_WINDOW)
}

fn make_raw(_: &ParamValues) -> Box<dyn FeatureBuilder> {
    Box::new(RawWorkTime::new())
}

fn make_diff(_: &ParamValues) -> Box<dyn FeatureBuilder> {
    Box::new(Diff::new())
}

fn make_moving_avg(params: &ParamValues) -> Box<dyn FeatureBuilder> {
    Box::new(MovingAverage::new(window_of(params)))
}

fn make_moving_std(params: &ParamValues) -> Box<dyn FeatureBuilder> {
    Box::new(MovingStd::new(window_of(params)))
}

/// The feature table
pub static FEATURE_REGISTRY: &[FeatureEntry] = &[
    FeatureEntry {
        kind: FeatureKind::RawWorkTime,
        feature_type: "raw_work_time",
        label: "Work time",
        description: "Measured work time as-is",
        params: &[],
        construct: make_raw,
    },
    FeatureEntry {
        kind: FeatureKind::Diff,
        feature_type: "diff",
        label: "Change from previous",
        description: "Difference to the previous measurement (first point is 0)",
        params: &[],
        construct: make_diff,
    },
    FeatureEntry {
        kind: FeatureKind::MovingAvg,
        feature_type: "moving_avg",
        label: "Moving average",
        description: "Trailing mean of recent work times (0 until the window is full)",
        params: WINDOW_PARAM,
        construct: make_moving_avg,
    },
    FeatureEntry {
        kind: FeatureKind::MovingStd,
        feature_type: "moving_std",
        label: "Moving standard deviation",
        description: "Trailing population standard deviation (0 until the window is full)",
        params: WINDOW_PARAM,
        construct: make_moving_std,
    },
];

/// Look up an entry by identifier
pub fn lookup(feature_type: &str) -> Option<&'static FeatureEntry> {
    FEATURE_REGISTRY.iter().find(|e| e.feature_type == feature_type)
}

impl FeatureKind {
    pub fn entry(self) -> &'static FeatureEntry {
        // every variant has exactly one row in FEATURE_REGISTRY
        FEATURE_REGISTRY
            .iter()
            .find(|e| e.kind == self)
            .unwrap_or(&FEATURE_REGISTRY[0])
    }

    pub fn identifier(self) -> &'static str {
        self.entry().feature_type
    }
}

impl FeatureEntry {
    /// Validate `spec.params` against the schema and fill in defaults
    fn resolve_params(&self, spec: &FeatureSpec) -> Result<ParamValues> {
        let invalid = |param: &str, reason: String| AnalysisError::InvalidFeatureParam {
            feature: self.feature_type.to_string(),
            param: param.to_string(),
            reason,
        };

        if let Some(unknown) = spec.params.keys().find(|k| !self.params.iter().any(|p| p.name == k.as_str())) {
            return Err(invalid(unknown, "unknown parameter".to_string()));
        }

        let mut values = ParamValues::new();
        for schema in self.params {
            let value = match spec.params.get(schema.name) {
                None | Some(serde_json::Value::Null) => schema.default,
                Some(raw) => raw
                    .as_i64()
                    .ok_or_else(|| invalid(schema.name, format!("expected an integer, got {raw}")))?,
            };
            if value < schema.min {
                return Err(invalid(schema.name, format!("must be >= {}, got {}", schema.min, value)));
            }
            values.insert(schema.name, value);
        }
        Ok(values)
    }

    /// Construct a builder from a spec targeting this entry
    pub fn create(&self, spec: &FeatureSpec) -> Result<Box<dyn FeatureBuilder>> {
        let params = self.resolve_params(spec)?;
        Ok((self.construct)(&params))
    }
}

/// Build the feature builder described by `config`.
///
/// - empty config -> raw work time
/// - one spec -> that builder directly
/// - several specs -> `Composite` in spec order
pub fn create_feature_builder(config: &FeatureConfig) -> Result<Box<dyn FeatureBuilder>> {
    let mut builders = config
        .features
        .iter()
        .map(|spec| {
            lookup(&spec.feature_type)
                .ok_or_else(|| AnalysisError::UnknownFeatureType(spec.feature_type.clone()))?
                .create(spec)
        })
        .collect::<Result<Vec<_>>>()?;

    match builders.len() {
        0 => Ok(Box::new(RawWorkTime::new())),
        1 => Ok(builders.remove(0)),
        _ => Ok(Box::new(Composite::new(builders)?)),
    }
}

// ============================================================================
// UI METADATA
// ============================================================================

/// Serializable view of one registry entry
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    pub feature_type: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub params_schema: BTreeMap<&'static str, ParamSchema>,
}

/// Registry metadata in table order
pub fn registry_info() -> Vec<FeatureInfo> {
    FEATURE_REGISTRY
        .iter()
        .map(|e| FeatureInfo {
            feature_type: e.feature_type,
            label: e.label,
            description: e.description,
            params_schema: e.params.iter().map(|p| (p.name, *p)).collect(),
        })
        .collect()
}
