//! Work-time measurements and timestamp normalisation
//!
//! All timestamps inside the engine are `NaiveDateTime`. Offsets are dropped
//! at the boundary (wall-clock time is kept, not converted to UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;
use super::error::{AnalysisError, Result};

/// Taxonomy node identifier
pub type NodeId = i64;

/// One work-time sample for a taxonomy node.
///
/// At most one measurement exists per (node, timestamp); later writes win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub category_id: NodeId,
    pub work_time: f64,
    pub recorded_at: NaiveDateTime,
}

impl Measurement {
    pub fn new(category_id: NodeId, work_time: f64, recorded_at: NaiveDateTime) -> Self {
        Self { category_id, work_time, recorded_at }
    }
}

/// Sort measurements ascending by timestamp (stable)
pub fn sort_by_time(records: &mut [Measurement]) {
    records.sort_by_key(|r| r.recorded_at);
}

/// Parse a timestamp string into the engine's naive representation.
///
/// Accepts RFC 3339 (offset dropped), `YYYY-MM-DDTHH:MM:SS[.f]`,
/// `YYYY-MM-DD HH:MM:SS[.f]` and bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(AnalysisError::InvalidTimestamp(raw.to_string()))
}

/// Format a timestamp the way the SQLite stores persist it
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter accepting any format understood by [`parse_timestamp`].
///
/// Use with `#[serde(with = "flexible_timestamp")]` on request payloads.
pub mod flexible_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Same as [`flexible_timestamp`] for `Vec<NaiveDateTime>` fields
pub mod flexible_timestamp_vec {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(items: &[NaiveDateTime], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for ts in items {
            seq.serialize_element(&super::format_timestamp(ts))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NaiveDateTime>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::parse_timestamp(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_offset_is_dropped_not_converted() {
        let ts = parse_timestamp("2025-01-01T09:00:00+09:00").unwrap();
        assert_eq!(ts, at(2025, 1, 1, 9));
    }

    #[test]
    fn test_naive_and_date_only_forms() {
        assert_eq!(parse_timestamp("2025-03-01T12:00:00").unwrap(), at(2025, 3, 1, 12));
        assert_eq!(parse_timestamp("2025-03-01 12:00:00").unwrap(), at(2025, 3, 1, 12));
        assert_eq!(parse_timestamp("2025-03-01").unwrap(), at(2025, 3, 1, 0));
        assert_eq!(parse_timestamp("2025-03-01T00:00:00Z").unwrap(), at(2025, 3, 1, 0));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_format_is_sortable() {
        let a = format_timestamp(&at(2025, 1, 2, 3));
        let b = format_timestamp(&at(2025, 11, 1, 0));
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).unwrap(), at(2025, 1, 2, 3));
    }

    #[test]
    fn test_sort_by_time() {
        let mut records = vec![
            Measurement::new(1, 30.0, at(2025, 3, 1, 0)),
            Measurement::new(1, 10.0, at(2025, 1, 1, 0)),
            Measurement::new(1, 20.0, at(2025, 2, 1, 0)),
        ];
        sort_by_time(&mut records);
        let values: Vec<f64> = records.iter().map(|r| r.work_time).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }
}
