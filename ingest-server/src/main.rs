//! wearwatch Server
//!
//! Ingestion and results API in front of the analysis engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    WEARWATCH SERVER                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │  API      │  │  Analysis    │  │  Event Bus        │  │
//! │  │  (Axum)   │─▶│  Engine      │  │  (broadcast/SSE)  │  │
//! │  └─────┬─────┘  └──────┬───────┘  └───────────────────┘  │
//! │        └───────────────┤                                 │
//! │                        ▼                                 │
//! │         ┌────────────────┐  ┌──────────────────┐         │
//! │         │ store.db       │  │ result_store.db  │         │
//! │         └────────────────┘  └──────────────────┘         │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod events;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wearwatch_core::{
    AnalysisEngine, DataStore, EngineConfig, ResultStore, SqliteDataStore, SqliteResultStore,
};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (also captures the engine's `log` records)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wearwatch_server=debug,wearwatch_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("wearwatch server v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    let data_store: Arc<dyn DataStore> = Arc::new(
        SqliteDataStore::open(config.store_path()).context("Failed to open data store")?,
    );
    let result_store: Arc<dyn ResultStore> = Arc::new(
        SqliteResultStore::open(config.result_path()).context("Failed to open result store")?,
    );

    let state = AppState::new(data_store, result_store, config.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub data_store: Arc<dyn DataStore>,
    pub result_store: Arc<dyn ResultStore>,
    pub engine: Arc<AnalysisEngine>,
    pub events: events::EventBus,
    pub config: config::Config,
}

impl AppState {
    /// Composition root: the engine shares the same store handles
    pub fn new(
        data_store: Arc<dyn DataStore>,
        result_store: Arc<dyn ResultStore>,
        config: config::Config,
    ) -> Self {
        let engine_config = EngineConfig {
            warning_threshold: config.trend_warning_threshold,
            ..Default::default()
        };
        let engine = AnalysisEngine::new(data_store.clone(), result_store.clone(), engine_config);

        Self {
            data_store,
            result_store,
            engine: Arc::new(engine),
            events: events::EventBus::new(),
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::health::check))

        // Ingestion
        .route("/api/records", post(handlers::records::ingest).get(handlers::records::list))
        .route("/api/records/csv", post(handlers::records::ingest_csv))

        // Taxonomy & registry
        .route("/api/categories", get(handlers::categories::tree))
        .route("/api/features", get(handlers::features::list))

        // Model definitions
        .route(
            "/api/models/:category_id",
            get(handlers::models::get)
                .put(handlers::models::put)
                .delete(handlers::models::delete),
        )

        // Results & analysis
        .route("/api/results/:category_id", get(handlers::results::get))
        .route("/api/analysis/run", post(handlers::analysis::run_all))

        // Notifications
        .route("/api/events", get(handlers::events::stream));

    Router::new()
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
