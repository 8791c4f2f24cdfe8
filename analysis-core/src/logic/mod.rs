//! Logic Module - Analysis pipeline
//!
//! - `features/` - feature builders, composite and registry
//! - `model/` - isolation forest and baseline-calibrated scoring
//! - `baseline/` - model definitions and baseline window selection
//! - `store/` - data/result store contracts (memory + SQLite)
//! - `engine.rs` - per-leaf orchestration (`run`, `run_all`)

pub mod error;
pub mod records;
pub mod taxonomy;
pub mod trend;

pub mod baseline;
pub mod features;
pub mod model;
pub mod store;

pub mod engine;
