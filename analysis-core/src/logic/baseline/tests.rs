use chrono::{NaiveDate, NaiveDateTime};

use super::{select_baseline, validate_definition, ModelDefinition};
use crate::logic::error::AnalysisError;
use crate::logic::features::{FeatureConfig, FeatureSpec};
use crate::logic::model::{AnomalyParams, Contamination};
use crate::logic::records::Measurement;

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn series(days: std::ops::RangeInclusive<u32>) -> Vec<Measurement> {
    days.map(|d| Measurement::new(1, 10.0 + d as f64, day(d))).collect()
}

#[test]
fn test_window_is_inclusive() {
    let records = series(1..=10);
    let def = ModelDefinition::new(1, day(3), day(6), 0.5);

    let picked: Vec<_> = select_baseline(&records, &def).iter().map(|m| m.recorded_at).collect();
    assert_eq!(picked, vec![day(3), day(4), day(5), day(6)]);
}

#[test]
fn test_excluded_points_removed() {
    let records = series(1..=10);
    let def = ModelDefinition::new(1, day(1), day(5), 0.5).with_excluded(vec![day(2), day(4)]);

    let picked: Vec<_> = select_baseline(&records, &def).iter().map(|m| m.recorded_at).collect();
    assert_eq!(picked, vec![day(1), day(3), day(5)]);
}

#[test]
fn test_exclusion_outside_window_is_ignored() {
    let records = series(1..=10);
    let def = ModelDefinition::new(1, day(1), day(3), 0.5).with_excluded(vec![day(9)]);
    assert_eq!(select_baseline(&records, &def).len(), 3);
}

#[test]
fn test_everything_excluded_gives_empty_baseline() {
    let records = series(1..=5);
    let def = ModelDefinition::new(1, day(2), day(3), 0.5).with_excluded(vec![day(2), day(3)]);
    assert!(select_baseline(&records, &def).is_empty());
}

#[test]
fn test_window_without_records() {
    let records = series(1..=5);
    let def = ModelDefinition::new(1, day(20), day(25), 0.5);
    assert!(select_baseline(&records, &def).is_empty());
}

#[test]
fn test_definition_json_accepts_offset_timestamps() {
    let json = r#"{
        "category_id": 7,
        "baseline_start": "2025-01-01T00:00:00+09:00",
        "baseline_end": "2025-01-31",
        "sensitivity": 0.5,
        "excluded_points": ["2025-01-05T00:00:00Z"]
    }"#;
    let def: ModelDefinition = serde_json::from_str(json).unwrap();
    assert_eq!(def.baseline_start, day(1));
    assert_eq!(def.baseline_end, day(31));
    assert_eq!(def.excluded_points, vec![day(5)]);
    assert!(def.feature_config.is_none());
    assert!(def.anomaly_params.is_none());
}

#[test]
fn test_definition_json_defaults_excluded_points() {
    let json = r#"{"category_id":1,"baseline_start":"2025-01-01","baseline_end":"2025-01-02","sensitivity":0.3}"#;
    let def: ModelDefinition = serde_json::from_str(json).unwrap();
    assert!(def.excluded_points.is_empty());
}

#[test]
fn test_validation_accepts_good_definition() {
    let def = ModelDefinition::new(1, day(1), day(10), 0.5)
        .with_feature_config(FeatureConfig::new(vec![
            FeatureSpec::new("raw_work_time"),
            FeatureSpec::new("moving_avg").with_param("window", 3),
        ]))
        .with_anomaly_params(AnomalyParams {
            contamination: Some(Contamination::Auto),
            ..Default::default()
        });
    assert!(validate_definition(&def).is_ok());
}

#[test]
fn test_validation_rejects_reversed_window() {
    let def = ModelDefinition::new(1, day(10), day(1), 0.5);
    assert!(matches!(
        validate_definition(&def),
        Err(AnalysisError::InvalidModelDefinition(_))
    ));
}

#[test]
fn test_validation_rejects_sensitivity_out_of_range() {
    let def = ModelDefinition::new(1, day(1), day(2), 1.5);
    assert!(matches!(
        validate_definition(&def),
        Err(AnalysisError::InvalidModelDefinition(_))
    ));
}

#[test]
fn test_validation_rejects_unknown_feature() {
    let def = ModelDefinition::new(1, day(1), day(2), 0.5)
        .with_feature_config(FeatureConfig::new(vec![FeatureSpec::new("fourier")]));
    match validate_definition(&def) {
        Err(AnalysisError::UnknownFeatureType(name)) => assert_eq!(name, "fourier"),
        other => panic!("Expected UnknownFeatureType, got {:?}", other),
    }
}

#[test]
fn test_validation_rejects_bad_anomaly_params() {
    let def = ModelDefinition::new(1, day(1), day(2), 0.5).with_anomaly_params(AnomalyParams {
        n_estimators: Some(0),
        ..Default::default()
    });
    assert!(matches!(
        validate_definition(&def),
        Err(AnalysisError::InvalidAnomalyParams(_))
    ));
}
