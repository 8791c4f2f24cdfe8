//! Record ingestion handlers (JSON batch + CSV)

use std::collections::{BTreeSet, HashSet};

use axum::{extract::{Query, State}, Json};
use serde_json::json;
use validator::Validate;

use wearwatch_core::{collect_leaves, parse_timestamp, Measurement, NodeId};

use crate::events::RECORDS_UPDATED;
use crate::models::{CsvRow, InsertResponse, RecordItem, RecordsBatchRequest, RecordsQuery, RecordsResponse};
use crate::{AppError, AppResult, AppState};
use super::blocking;

/// Batch ingest from JSON
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<RecordsBatchRequest>,
) -> AppResult<Json<InsertResponse>> {
    req.validate()?;
    Ok(Json(store_items(&state, req.records).await?))
}

/// Ingest a `category,work_time,recorded_at` CSV body
pub async fn ingest_csv(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<InsertResponse>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut items = Vec::new();
    for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
        let item = row?.into_item(idx + 2)?;
        item.validate()?;
        items.push(item);
    }

    if items.is_empty() {
        return Err(AppError::ValidationError("CSV contains no records".to_string()));
    }

    Ok(Json(store_items(&state, items).await?))
}

/// Records of one category, optionally bounded
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> AppResult<Json<RecordsResponse>> {
    let start = query.start.as_deref().map(parse_timestamp).transpose()?;
    let end = query.end.as_deref().map(parse_timestamp).transpose()?;

    let store = state.data_store.clone();
    let records = blocking(move || store.get_records(query.category_id, start, end)).await?;
    Ok(Json(RecordsResponse { records }))
}

/// Resolve paths, upsert, optionally re-analyse, then notify
async fn store_items(state: &AppState, items: Vec<RecordItem>) -> AppResult<InsertResponse> {
    let store = state.data_store.clone();
    let (inserted, touched) = blocking(move || {
        let mut touched = BTreeSet::new();
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let category_id = store.ensure_category_path(&item.category_path)?;
            touched.insert(category_id);
            records.push(Measurement::new(category_id, item.work_time, item.recorded_at));
        }
        let inserted = store.upsert_records(&records)?;
        Ok((inserted, touched.into_iter().collect::<Vec<NodeId>>()))
    })
    .await?;

    tracing::info!("Ingested {} records across {} categories", inserted, touched.len());

    if state.config.analyze_on_ingest {
        let store = state.data_store.clone();
        let engine = state.engine.clone();
        let ids = touched.clone();
        let analysed = blocking(move || {
            let tree = store.get_taxonomy_tree(None)?;
            let leaves: HashSet<NodeId> = collect_leaves(&tree).iter().map(|n| n.id).collect();

            // internal nodes may hold records but are never analysed directly
            let mut analysed = 0usize;
            for id in ids.into_iter().filter(|id| leaves.contains(id)) {
                engine.run(id)?;
                analysed += 1;
            }
            Ok(analysed)
        })
        .await?;
        tracing::debug!("Analysed {} touched leaf categories", analysed);
    }

    state
        .events
        .publish(RECORDS_UPDATED, json!({ "inserted": inserted, "category_ids": touched }));

    Ok(InsertResponse { inserted, category_ids: touched })
}
