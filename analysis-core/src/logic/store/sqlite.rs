//! SQLite stores
//!
//! One connection per store behind a `Mutex`. Timestamps are stored as naive
//! ISO strings (`TIMESTAMP_FORMAT`), so lexical order equals time order.

use std::path::Path;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::logic::baseline::ModelDefinition;
use crate::logic::error::{Result, StoreError};
use crate::logic::features::FeatureConfig;
use crate::logic::model::AnomalyParams;
use crate::logic::records::{format_timestamp, parse_timestamp, Measurement, NodeId};
use crate::logic::taxonomy::{build_tree, CategoryRow, TaxonomyNode};
use super::{normalize_path, AnomalyResult, DataStore, ResultStore, TrendResult};

// ============================================================================
// SCHEMA
// ============================================================================

const DATA_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES categories(id),
    UNIQUE(name, parent_id)
);

CREATE TABLE IF NOT EXISTS work_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    work_time   REAL NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE(category_id, recorded_at)
);

CREATE INDEX IF NOT EXISTS idx_work_records_category_time
    ON work_records(category_id, recorded_at);
";

const RESULT_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trend_results (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL UNIQUE,
    slope       REAL NOT NULL,
    intercept   REAL NOT NULL,
    is_warning  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS anomaly_results (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id   INTEGER NOT NULL,
    recorded_at   TEXT NOT NULL,
    anomaly_score REAL NOT NULL,
    UNIQUE(category_id, recorded_at)
);

CREATE INDEX IF NOT EXISTS idx_anomaly_results_category
    ON anomaly_results(category_id);

CREATE TABLE IF NOT EXISTS model_definitions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id     INTEGER NOT NULL UNIQUE,
    baseline_start  TEXT NOT NULL,
    baseline_end    TEXT NOT NULL,
    sensitivity     REAL NOT NULL,
    excluded_points TEXT NOT NULL DEFAULT '[]',
    feature_config  TEXT,
    anomaly_params  TEXT
);
";

fn open_connection(path: Option<&Path>, schema: &str) -> Result<Connection> {
    let conn = match path {
        Some(p) => Connection::open(p)?,
        None => Connection::open_in_memory()?,
    };
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(schema)?;
    Ok(conn)
}

fn decode_timestamp(raw: &str) -> Result<NaiveDateTime> {
    parse_timestamp(raw).map_err(|_| StoreError::Corrupt(format!("bad timestamp '{}'", raw)).into())
}

// ============================================================================
// DATA STORE
// ============================================================================

pub struct SqliteDataStore {
    conn: Mutex<Connection>,
}

impl SqliteDataStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_connection(Some(path.as_ref()), DATA_SCHEMA)?;
        log::debug!("Opened data store at {}", path.as_ref().display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Mutex::new(open_connection(None, DATA_SCHEMA)?) })
    }
}

impl DataStore for SqliteDataStore {
    fn upsert_records(&self, records: &[Measurement]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO work_records (category_id, work_time, recorded_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(category_id, recorded_at)
                 DO UPDATE SET work_time = excluded.work_time",
            )?;
            for r in records {
                stmt.execute(params![r.category_id, r.work_time, format_timestamp(&r.recorded_at)])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn ensure_category_path(&self, path: &[String]) -> Result<NodeId> {
        let path = normalize_path(path)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut parent: Option<NodeId> = None;
        for name in &path {
            let existing: Option<NodeId> = tx
                .query_row(
                    "SELECT id FROM categories WHERE name = ?1 AND parent_id IS ?2",
                    params![name, parent],
                    |row| row.get(0),
                )
                .optional()?;

            let id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
                        params![name, parent],
                    )?;
                    tx.last_insert_rowid()
                }
            };
            parent = Some(id);
        }

        tx.commit()?;
        Ok(parent.unwrap_or_default())
    }

    fn get_records(
        &self,
        category_id: NodeId,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT work_time, recorded_at FROM work_records
             WHERE category_id = ?1
               AND (?2 IS NULL OR recorded_at >= ?2)
               AND (?3 IS NULL OR recorded_at <= ?3)
             ORDER BY recorded_at ASC",
        )?;

        let rows = stmt
            .query_map(
                params![
                    category_id,
                    start.as_ref().map(format_timestamp),
                    end.as_ref().map(format_timestamp)
                ],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?)),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(work_time, ts)| Ok(Measurement::new(category_id, work_time, decode_timestamp(&ts)?)))
            .collect()
    }

    fn get_taxonomy_tree(&self, root: Option<NodeId>) -> Result<Vec<TaxonomyNode>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "WITH RECURSIVE tree AS (
                 SELECT id, name, parent_id FROM categories
                 WHERE (?1 IS NULL AND parent_id IS NULL) OR id = ?1
                 UNION ALL
                 SELECT c.id, c.name, c.parent_id
                 FROM categories c JOIN tree t ON c.parent_id = t.id
             )
             SELECT id, name, parent_id FROM tree ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![root], |row| {
                Ok(CategoryRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    parent_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(build_tree(&rows, root))
    }

    fn delete_all_data(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch("DELETE FROM work_records; DELETE FROM categories;")?;
        Ok(())
    }
}

// ============================================================================
// RESULT STORE
// ============================================================================

pub struct SqliteResultStore {
    conn: Mutex<Connection>,
}

impl SqliteResultStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_connection(Some(path.as_ref()), RESULT_SCHEMA)?;
        log::debug!("Opened result store at {}", path.as_ref().display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Mutex::new(open_connection(None, RESULT_SCHEMA)?) })
    }
}

/// Raw `model_definitions` row before JSON decoding
struct DefinitionRow {
    baseline_start: String,
    baseline_end: String,
    sensitivity: f64,
    excluded_points: String,
    feature_config: Option<String>,
    anomaly_params: Option<String>,
}

impl DefinitionRow {
    fn decode(self, category_id: NodeId) -> Result<ModelDefinition> {
        let excluded: Vec<String> = serde_json::from_str(&self.excluded_points)?;
        let feature_config: Option<FeatureConfig> =
            self.feature_config.as_deref().map(serde_json::from_str).transpose()?;
        let anomaly_params: Option<AnomalyParams> =
            self.anomaly_params.as_deref().map(serde_json::from_str).transpose()?;

        Ok(ModelDefinition {
            category_id,
            baseline_start: decode_timestamp(&self.baseline_start)?,
            baseline_end: decode_timestamp(&self.baseline_end)?,
            sensitivity: self.sensitivity,
            excluded_points: excluded
                .iter()
                .map(|s| decode_timestamp(s))
                .collect::<Result<Vec<_>>>()?,
            feature_config,
            anomaly_params,
        })
    }
}

impl ResultStore for SqliteResultStore {
    fn save_trend_result(&self, result: &TrendResult) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO trend_results (category_id, slope, intercept, is_warning)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(category_id)
             DO UPDATE SET slope = excluded.slope,
                           intercept = excluded.intercept,
                           is_warning = excluded.is_warning",
            params![result.category_id, result.slope, result.intercept, result.is_warning],
        )?;
        Ok(())
    }

    fn get_trend_result(&self, category_id: NodeId) -> Result<Option<TrendResult>> {
        let result = self
            .conn
            .lock()
            .query_row(
                "SELECT slope, intercept, is_warning FROM trend_results WHERE category_id = ?1",
                params![category_id],
                |row| {
                    Ok(TrendResult {
                        category_id,
                        slope: row.get(0)?,
                        intercept: row.get(1)?,
                        is_warning: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    fn save_anomaly_results(&self, results: &[AnomalyResult]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO anomaly_results (category_id, recorded_at, anomaly_score)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(category_id, recorded_at)
                 DO UPDATE SET anomaly_score = excluded.anomaly_score",
            )?;
            for r in results {
                stmt.execute(params![r.category_id, format_timestamp(&r.recorded_at), r.anomaly_score])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_anomaly_results(&self, category_id: NodeId) -> Result<Vec<AnomalyResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT recorded_at, anomaly_score FROM anomaly_results
             WHERE category_id = ?1 ORDER BY recorded_at ASC",
        )?;
        let rows = stmt
            .query_map(params![category_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(ts, anomaly_score)| {
                Ok(AnomalyResult {
                    category_id,
                    recorded_at: decode_timestamp(&ts)?,
                    anomaly_score,
                })
            })
            .collect()
    }

    fn save_model_definition(&self, definition: &ModelDefinition) -> Result<()> {
        let excluded: Vec<String> = definition.excluded_points.iter().map(format_timestamp).collect();
        let excluded_json = serde_json::to_string(&excluded)?;
        let feature_json = definition.feature_config.as_ref().map(serde_json::to_string).transpose()?;
        let params_json = definition.anomaly_params.as_ref().map(serde_json::to_string).transpose()?;

        self.conn.lock().execute(
            "INSERT INTO model_definitions
                 (category_id, baseline_start, baseline_end, sensitivity,
                  excluded_points, feature_config, anomaly_params)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(category_id)
             DO UPDATE SET baseline_start = excluded.baseline_start,
                           baseline_end = excluded.baseline_end,
                           sensitivity = excluded.sensitivity,
                           excluded_points = excluded.excluded_points,
                           feature_config = excluded.feature_config,
                           anomaly_params = excluded.anomaly_params",
            params![
                definition.category_id,
                format_timestamp(&definition.baseline_start),
                format_timestamp(&definition.baseline_end),
                definition.sensitivity,
                excluded_json,
                feature_json,
                params_json
            ],
        )?;
        Ok(())
    }

    fn get_model_definition(&self, category_id: NodeId) -> Result<Option<ModelDefinition>> {
        let row = self
            .conn
            .lock()
            .query_row(
                "SELECT baseline_start, baseline_end, sensitivity,
                        excluded_points, feature_config, anomaly_params
                 FROM model_definitions WHERE category_id = ?1",
                params![category_id],
                |row| {
                    Ok(DefinitionRow {
                        baseline_start: row.get(0)?,
                        baseline_end: row.get(1)?,
                        sensitivity: row.get(2)?,
                        excluded_points: row.get(3)?,
                        feature_config: row.get(4)?,
                        anomaly_params: row.get(5)?,
                    })
                },
            )
            .optional()?;

        row.map(|r| r.decode(category_id)).transpose()
    }

    fn delete_model_definition(&self, category_id: NodeId) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM model_definitions WHERE category_id = ?1", params![category_id])?;
        tx.execute("DELETE FROM anomaly_results WHERE category_id = ?1", params![category_id])?;
        tx.commit()?;
        Ok(())
    }

    fn delete_anomaly_results(&self, category_id: NodeId) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM anomaly_results WHERE category_id = ?1", params![category_id])?;
        Ok(())
    }

    fn delete_all_data(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            "DELETE FROM anomaly_results; DELETE FROM trend_results; DELETE FROM model_definitions;",
        )?;
        Ok(())
    }
}
