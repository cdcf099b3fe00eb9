//! Store traits consumed by the resolver, the query engine and the ingester.
//!
//! Services receive these as `Arc<dyn ...>` at construction. The PostgreSQL
//! implementations live next door; in-memory ones for tests live in
//! `test-utils`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use kairos_common::{Cell, ForecastTile, GeoEntity, GeoPoint, KairosResult, NewForecastTile, RunId};

/// Liveness of the backing store, used by readiness checks.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> KairosResult<()>;
}

/// Read access to the place hierarchy.
#[async_trait]
pub trait GeoEntityStore: Send + Sync {
    /// Page through places ordered by name, optionally restricted to one type.
    async fn list(
        &self,
        entity_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> KairosResult<Vec<GeoEntity>>;

    async fn find_by_id(&self, id: i64) -> KairosResult<Option<GeoEntity>>;

    /// Exact, case-sensitive match on name, name_en or name_local.
    ///
    /// Ties resolve enabled first, cities first, larger population first,
    /// then lowest id.
    async fn find_by_exact_name(&self, name: &str) -> KairosResult<Option<GeoEntity>>;

    /// Case-insensitive substring search across all names.
    async fn search(&self, query: &str, limit: i64) -> KairosResult<Vec<GeoEntity>>;

    /// Places whose geometry contains the point, most specific first.
    async fn find_by_coordinates(&self, point: GeoPoint, limit: i64)
        -> KairosResult<Vec<GeoEntity>>;

    async fn find_children(&self, parent_id: i64) -> KairosResult<Vec<GeoEntity>>;

    /// All enabled places of type `city` with a centroid, in id order.
    async fn enabled_cities(&self) -> KairosResult<Vec<GeoEntity>>;
}

/// The polygonal cell index.
#[async_trait]
pub trait CellStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> KairosResult<Option<Cell>>;

    /// Enabled cell whose boundary contains the point; lowest id on overlap.
    async fn find_containing(&self, point: GeoPoint) -> KairosResult<Option<Cell>>;

    /// Nearest enabled cell whose boundary lies within `radius_m`, with the
    /// distance in meters.
    async fn find_nearest_within(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> KairosResult<Option<(Cell, f64)>>;

    async fn count_enabled(&self) -> KairosResult<i64>;
}

/// Summary of what the tile store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataStatus {
    pub tile_count: i64,
    pub cells_with_data: i64,
    pub latest_run: Option<RunId>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Per-cell forecast tiles.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Newest run with at least one tile for the cell.
    async fn latest_run(&self, cell_id: i64) -> KairosResult<Option<RunId>>;

    /// Tiles of one run at or after `from`, ascending, at most `limit`.
    async fn run_tiles_from(
        &self,
        cell_id: i64,
        run: &RunId,
        from: DateTime<Utc>,
        limit: i64,
    ) -> KairosResult<Vec<ForecastTile>>;

    /// One tile per instant in `[start, end]`, ascending. When several runs
    /// cover the same instant the newest run wins.
    async fn tiles_in_range(
        &self,
        cell_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<Vec<ForecastTile>>;

    /// Earliest tile at or after `from`; newest run on ties.
    async fn next_tile(&self, cell_id: i64, from: DateTime<Utc>)
        -> KairosResult<Option<ForecastTile>>;

    /// Insert or replace on (cell, instant, run). Returns rows written.
    async fn upsert_tiles(&self, tiles: &[NewForecastTile]) -> KairosResult<u64>;

    /// Delete tiles whose forecast instant is before `cutoff`.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> KairosResult<u64>;

    async fn data_status(&self) -> KairosResult<DataStatus>;
}
