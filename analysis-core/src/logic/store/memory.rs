//! In-memory stores
//!
//! Same semantics as the SQLite stores, backed by `RwLock`-guarded maps.

use std::collections::{BTreeMap, HashMap};
use chrono::NaiveDateTime;
use parking_lot::RwLock;

use crate::logic::baseline::ModelDefinition;
use crate::logic::error::Result;
use crate::logic::records::{Measurement, NodeId};
use crate::logic::taxonomy::{build_tree, CategoryRow, TaxonomyNode};
use super::{normalize_path, AnomalyResult, DataStore, ResultStore, TrendResult};

// ============================================================================
// DATA STORE
// ============================================================================

#[derive(Debug, Default)]
struct DataState {
    categories: Vec<CategoryRow>,
    next_id: NodeId,
    /// node -> time -> value; the inner map keeps records sorted and unique
    records: HashMap<NodeId, BTreeMap<NaiveDateTime, f64>>,
}

#[derive(Debug, Default)]
pub struct MemoryDataStore {
    state: RwLock<DataState>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryDataStore {
    fn upsert_records(&self, records: &[Measurement]) -> Result<usize> {
        let mut state = self.state.write();
        for r in records {
            state
                .records
                .entry(r.category_id)
                .or_default()
                .insert(r.recorded_at, r.work_time);
        }
        Ok(records.len())
    }

    fn ensure_category_path(&self, path: &[String]) -> Result<NodeId> {
        let path = normalize_path(path)?;
        let mut state = self.state.write();

        let mut parent: Option<NodeId> = None;
        for name in &path {
            let existing = state
                .categories
                .iter()
                .find(|c| c.parent_id == parent && &c.name == name)
                .map(|c| c.id);

            let id = match existing {
                Some(id) => id,
                None => {
                    state.next_id += 1;
                    let id = state.next_id;
                    state.categories.push(CategoryRow { id, name: name.clone(), parent_id: parent });
                    id
                }
            };
            parent = Some(id);
        }

        // normalize_path guarantees at least one segment
        Ok(parent.unwrap_or_default())
    }

    fn get_records(
        &self,
        category_id: NodeId,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>> {
        let state = self.state.read();
        let Some(series) = state.records.get(&category_id) else {
            return Ok(Vec::new());
        };

        Ok(series
            .iter()
            .filter(|(ts, _)| start.map_or(true, |s| **ts >= s))
            .filter(|(ts, _)| end.map_or(true, |e| **ts <= e))
            .map(|(ts, v)| Measurement::new(category_id, *v, *ts))
            .collect())
    }

    fn get_taxonomy_tree(&self, root: Option<NodeId>) -> Result<Vec<TaxonomyNode>> {
        let state = self.state.read();
        Ok(build_tree(&state.categories, root))
    }

    fn delete_all_data(&self) -> Result<()> {
        *self.state.write() = DataState::default();
        Ok(())
    }
}

// ============================================================================
// RESULT STORE
// ============================================================================

#[derive(Debug, Default)]
struct ResultState {
    trends: HashMap<NodeId, TrendResult>,
    anomalies: HashMap<NodeId, BTreeMap<NaiveDateTime, f64>>,
    definitions: HashMap<NodeId, ModelDefinition>,
}

#[derive(Debug, Default)]
pub struct MemoryResultStore {
    state: RwLock<ResultState>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn save_trend_result(&self, result: &TrendResult) -> Result<()> {
        self.state.write().trends.insert(result.category_id, *result);
        Ok(())
    }

    fn get_trend_result(&self, category_id: NodeId) -> Result<Option<TrendResult>> {
        Ok(self.state.read().trends.get(&category_id).copied())
    }

    fn save_anomaly_results(&self, results: &[AnomalyResult]) -> Result<()> {
        let mut state = self.state.write();
        for r in results {
            state
                .anomalies
                .entry(r.category_id)
                .or_default()
                .insert(r.recorded_at, r.anomaly_score);
        }
        Ok(())
    }

    fn get_anomaly_results(&self, category_id: NodeId) -> Result<Vec<AnomalyResult>> {
        let state = self.state.read();
        Ok(state
            .anomalies
            .get(&category_id)
            .map(|scores| {
                scores
                    .iter()
                    .map(|(ts, score)| AnomalyResult {
                        category_id,
                        recorded_at: *ts,
                        anomaly_score: *score,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn save_model_definition(&self, definition: &ModelDefinition) -> Result<()> {
        self.state
            .write()
            .definitions
            .insert(definition.category_id, definition.clone());
        Ok(())
    }

    fn get_model_definition(&self, category_id: NodeId) -> Result<Option<ModelDefinition>> {
        Ok(self.state.read().definitions.get(&category_id).cloned())
    }

    fn delete_model_definition(&self, category_id: NodeId) -> Result<()> {
        let mut state = self.state.write();
        state.definitions.remove(&category_id);
        state.anomalies.remove(&category_id);
        Ok(())
    }

    fn delete_anomaly_results(&self, category_id: NodeId) -> Result<()> {
        self.state.write().anomalies.remove(&category_id);
        Ok(())
    }

    fn delete_all_data(&self) -> Result<()> {
        *self.state.write() = ResultState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_path_is_reused() {
        let store = MemoryDataStore::new();
        let a = store.ensure_category_path(&path(&["Line A", "Press 1"])).unwrap();
        let b = store.ensure_category_path(&path(&["Line A", "Press 1"])).unwrap();
        let c = store.ensure_category_path(&path(&["Line A", "Press 2"])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let tree = store.get_taxonomy_tree(None).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Line A");
        assert_eq!(tree[0].children.len(), 2);
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let store = MemoryDataStore::new();
        let a = store.ensure_category_path(&path(&["Line A", "Press"])).unwrap();
        let b = store.ensure_category_path(&path(&["Line B", "Press"])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_upsert_overwrites_and_sorts() {
        let store = MemoryDataStore::new();
        store
            .upsert_records(&[
                Measurement::new(1, 30.0, day(3)),
                Measurement::new(1, 10.0, day(1)),
                Measurement::new(1, 20.0, day(2)),
            ])
            .unwrap();
        store.upsert_records(&[Measurement::new(1, 99.0, day(2))]).unwrap();

        let records = store.get_records(1, None, None).unwrap();
        let values: Vec<f64> = records.iter().map(|r| r.work_time).collect();
        assert_eq!(values, vec![10.0, 99.0, 30.0]);

        let window = store.get_records(1, Some(day(2)), Some(day(3))).unwrap();
        assert_eq!(window.len(), 2);
        assert!(store.get_records(2, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_definition_cascades_to_anomalies_only() {
        let results = MemoryResultStore::new();
        results
            .save_model_definition(&ModelDefinition::new(1, day(1), day(2), 0.5))
            .unwrap();
        results
            .save_trend_result(&TrendResult { category_id: 1, slope: 0.1, intercept: 1.0, is_warning: false })
            .unwrap();
        results
            .save_anomaly_results(&[AnomalyResult { category_id: 1, recorded_at: day(1), anomaly_score: 0.4 }])
            .unwrap();

        results.delete_model_definition(1).unwrap();
        assert!(results.get_model_definition(1).unwrap().is_none());
        assert!(results.get_anomaly_results(1).unwrap().is_empty());
        assert!(results.get_trend_result(1).unwrap().is_some());

        // deleting again is not an error
        results.delete_model_definition(1).unwrap();
    }
}
