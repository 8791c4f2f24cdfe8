//! Configuration module

use std::env;
use std::path::PathBuf;

use wearwatch_core::constants::{APP_NAME, WARNING_THRESHOLD};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding both SQLite files
    pub data_dir: PathBuf,

    /// Raw records + taxonomy database file name
    pub store_db: String,

    /// Results + model definitions database file name
    pub result_db: String,

    /// Trend slope above which a node is flagged
    pub trend_warning_threshold: f64,

    /// Re-run analysis for touched leaves after every ingest
    pub analyze_on_ingest: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::data_local_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join(APP_NAME)
                }),

            store_db: env::var("STORE_DB").unwrap_or_else(|_| "store.db".to_string()),

            result_db: env::var("RESULT_DB").unwrap_or_else(|_| "result_store.db".to_string()),

            trend_warning_threshold: env::var("TREND_WARNING_THRESHOLD")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(WARNING_THRESHOLD),

            analyze_on_ingest: env::var("ANALYZE_ON_INGEST")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_db)
    }

    pub fn result_path(&self) -> PathBuf {
        self.data_dir.join(&self.result_db)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("."),
            store_db: "store.db".to_string(),
            result_db: "result_store.db".to_string(),
            trend_warning_threshold: WARNING_THRESHOLD,
            analyze_on_ingest: true,
            environment: "development".to_string(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
