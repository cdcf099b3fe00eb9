//! Application state for the Kairos API.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use storage::{
    CellStore, Database, GeoEntityStore, PgCellStore, PgGeoEntityStore, PgTileStore, StoreHealth,
    TileStore,
};

use crate::config::KairosConfig;
use crate::engine::QueryEngine;
use crate::resolution_cache::ResolutionCache;
use crate::resolver::LocationResolver;

/// Shared application state.
pub struct AppState {
    pub config: KairosConfig,

    pub places: Arc<dyn GeoEntityStore>,
    pub cells: Arc<dyn CellStore>,
    pub tiles: Arc<dyn TileStore>,

    /// Backing store liveness for `/ready` and `/system`.
    pub health: Arc<dyn StoreHealth>,

    pub engine: QueryEngine,

    /// Renders `/metrics`; absent when no recorder was installed.
    pub metrics: Option<PrometheusHandle>,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Connect to PostgreSQL and wire the stores.
    pub async fn new(config: KairosConfig, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let db = Database::connect(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to database")?;

        tracing::info!(
            max_connections = config.database.max_connections,
            "Connected to database"
        );

        let pool = db.pool().clone();
        Ok(Self::from_parts(
            config,
            Arc::new(PgGeoEntityStore::new(pool.clone())),
            Arc::new(PgCellStore::new(pool.clone())),
            Arc::new(PgTileStore::new(pool)),
            Arc::new(db),
            metrics,
        ))
    }

    /// Assemble state from already-built stores.
    pub fn from_parts(
        config: KairosConfig,
        places: Arc<dyn GeoEntityStore>,
        cells: Arc<dyn CellStore>,
        tiles: Arc<dyn TileStore>,
        health: Arc<dyn StoreHealth>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let cache = ResolutionCache::new(
            config.resolver_cache.capacity,
            config.resolver_cache.ttl_secs,
        );
        let resolver = Arc::new(LocationResolver::new(places.clone(), cells.clone(), cache));
        let engine = QueryEngine::new(
            places.clone(),
            cells.clone(),
            tiles.clone(),
            resolver,
            config.query.clone(),
        );

        Self {
            config,
            places,
            cells,
            tiles,
            health,
            engine,
            metrics,
            started_at: Utc::now(),
        }
    }
}
