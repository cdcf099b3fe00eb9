//! In-memory implementations of the store traits.
//!
//! Geometries are axis-aligned boxes. Ordering and tie-break rules match
//! the PostgreSQL queries in the `storage` crate so tests exercising the
//! resolver and engine see the same results a database would return.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use kairos_common::{
    BoundingBox, Cell, ForecastTile, GeoEntity, GeoPoint, KairosError, KairosResult,
    NewForecastTile, RunId,
};
use storage::{CellStore, DataStatus, GeoEntityStore, StoreHealth, TileStore};

/// Error text a real driver might produce; must never reach clients.
pub const DRIVER_ERROR_TEXT: &str =
    "error communicating with database: Connection reset by peer (os error 104)";

#[derive(Debug, Clone)]
struct StoredCell {
    cell: Cell,
    bounds: BoundingBox,
}

#[derive(Debug, Clone)]
struct StoredPlace {
    entity: GeoEntity,
    bounds: Option<BoundingBox>,
}

/// One store backing all three traits.
#[derive(Default)]
pub struct InMemoryStore {
    places: Vec<StoredPlace>,
    cells: Vec<StoredCell>,
    tiles: RwLock<Vec<ForecastTile>>,
    failing_cells: HashSet<i64>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, cell: Cell, bounds: BoundingBox) -> Self {
        self.cells.push(StoredCell { cell, bounds });
        self
    }

    pub fn with_place(mut self, entity: GeoEntity, bounds: Option<BoundingBox>) -> Self {
        self.places.push(StoredPlace { entity, bounds });
        self
    }

    pub fn with_tile(mut self, tile: NewForecastTile, created_at: DateTime<Utc>) -> Self {
        let tiles = self.tiles.get_mut();
        let id = tiles.len() as i64 + 1;
        tiles.push(ForecastTile {
            id,
            cell_id: tile.cell_id,
            run_date: tile.run.run_date,
            utc_cycle_time: tile.run.cycle,
            forecast_datetime: tile.forecast_datetime,
            forecast_data: tile.forecast_data,
            created_at,
            updated_at: created_at,
        });
        self
    }

    /// Tile queries for this cell fail with a driver-style error.
    pub fn with_failing_cell(mut self, cell_id: i64) -> Self {
        self.failing_cells.insert(cell_id);
        self
    }

    /// Every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn tile_count(&self) -> usize {
        self.tiles.read().await.len()
    }

    fn check_online(&self) -> KairosResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(KairosError::DatabaseError(DRIVER_ERROR_TEXT.to_string()))
        } else {
            Ok(())
        }
    }

    fn check_cell(&self, cell_id: i64) -> KairosResult<()> {
        self.check_online()?;
        if self.failing_cells.contains(&cell_id) {
            return Err(KairosError::DatabaseError(DRIVER_ERROR_TEXT.to_string()));
        }
        Ok(())
    }
}

/// Distance from a point to the nearest edge of a box; 0 inside.
fn distance_to_bounds_m(point: GeoPoint, bounds: &BoundingBox) -> f64 {
    let nearest = GeoPoint::new(
        point.latitude.clamp(bounds.south, bounds.north),
        point.longitude.clamp(bounds.west, bounds.east),
    );
    point.distance_m(&nearest)
}

fn bounds_center(bounds: &BoundingBox) -> GeoPoint {
    GeoPoint::new(
        (bounds.south + bounds.north) / 2.0,
        (bounds.west + bounds.east) / 2.0,
    )
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn equals_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase() == needle)
}

/// Same ranking as the ILIKE search query.
fn search_rank(entity: &GeoEntity, needle: &str) -> Option<u8> {
    let name = Some(entity.name.as_str());
    let name_en = entity.name_en.as_deref();
    let name_local = entity.name_local.as_deref();

    if equals_ci(name, needle) {
        Some(0)
    } else if contains_ci(name, needle) {
        Some(1)
    } else if equals_ci(name_en, needle) {
        Some(2)
    } else if contains_ci(name_en, needle) {
        Some(3)
    } else if equals_ci(name_local, needle) {
        Some(4)
    } else if contains_ci(name_local, needle) {
        Some(5)
    } else if entity
        .alt_names
        .iter()
        .any(|alt| alt.to_lowercase().contains(needle))
    {
        Some(6)
    } else {
        None
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> KairosResult<()> {
        self.check_online()
    }
}

#[async_trait]
impl GeoEntityStore for InMemoryStore {
    async fn list(
        &self,
        entity_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> KairosResult<Vec<GeoEntity>> {
        self.check_online()?;
        let mut found: Vec<GeoEntity> = self
            .places
            .iter()
            .filter(|p| entity_type.map_or(true, |t| p.entity.entity_type == t))
            .map(|p| p.entity.clone())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page(found, limit, offset))
    }

    async fn find_by_id(&self, id: i64) -> KairosResult<Option<GeoEntity>> {
        self.check_online()?;
        Ok(self
            .places
            .iter()
            .find(|p| p.entity.id == id)
            .map(|p| p.entity.clone()))
    }

    async fn find_by_exact_name(&self, name: &str) -> KairosResult<Option<GeoEntity>> {
        self.check_online()?;
        let mut found: Vec<&GeoEntity> = self
            .places
            .iter()
            .map(|p| &p.entity)
            .filter(|e| e.has_name(name))
            .collect();
        found.sort_by(|a, b| {
            b.is_enabled
                .cmp(&a.is_enabled)
                .then(b.is_city().cmp(&a.is_city()))
                .then(b.population.unwrap_or(-1).cmp(&a.population.unwrap_or(-1)))
                .then(a.id.cmp(&b.id))
        });
        Ok(found.first().map(|e| (*e).clone()))
    }

    async fn search(&self, query: &str, limit: i64) -> KairosResult<Vec<GeoEntity>> {
        self.check_online()?;
        let needle = query.to_lowercase();
        let mut ranked: Vec<(u8, &GeoEntity)> = self
            .places
            .iter()
            .filter_map(|p| search_rank(&p.entity, &needle).map(|rank| (rank, &p.entity)))
            .collect();
        ranked.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then(b.population.unwrap_or(-1).cmp(&a.population.unwrap_or(-1)))
                .then(a.id.cmp(&b.id))
        });
        Ok(page(
            ranked.into_iter().map(|(_, e)| e.clone()).collect(),
            limit,
            0,
        ))
    }

    async fn find_by_coordinates(
        &self,
        point: GeoPoint,
        limit: i64,
    ) -> KairosResult<Vec<GeoEntity>> {
        self.check_online()?;
        let mut found: Vec<&GeoEntity> = self
            .places
            .iter()
            .filter(|p| {
                p.bounds
                    .as_ref()
                    .is_some_and(|b| b.contains(point.latitude, point.longitude))
            })
            .map(|p| &p.entity)
            .collect();
        found.sort_by(|a, b| {
            b.admin_level
                .cmp(&a.admin_level)
                .then(b.population.unwrap_or(-1).cmp(&a.population.unwrap_or(-1)))
                .then(a.id.cmp(&b.id))
        });
        Ok(page(found.into_iter().cloned().collect(), limit, 0))
    }

    async fn find_children(&self, parent_id: i64) -> KairosResult<Vec<GeoEntity>> {
        self.check_online()?;
        let mut found: Vec<GeoEntity> = self
            .places
            .iter()
            .filter(|p| p.entity.parent_id == Some(parent_id))
            .map(|p| p.entity.clone())
            .collect();
        found.sort_by(|a, b| {
            a.admin_level
                .cmp(&b.admin_level)
                .then(a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        Ok(found)
    }

    async fn enabled_cities(&self) -> KairosResult<Vec<GeoEntity>> {
        self.check_online()?;
        let mut found: Vec<GeoEntity> = self
            .places
            .iter()
            .map(|p| &p.entity)
            .filter(|e| e.is_city() && e.is_enabled && e.centroid.is_some())
            .cloned()
            .collect();
        found.sort_by_key(|e| e.id);
        Ok(found)
    }
}

#[async_trait]
impl CellStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> KairosResult<Option<Cell>> {
        self.check_online()?;
        Ok(self
            .cells
            .iter()
            .find(|c| c.cell.id == id)
            .map(|c| c.cell.clone()))
    }

    async fn find_containing(&self, point: GeoPoint) -> KairosResult<Option<Cell>> {
        self.check_online()?;
        Ok(self
            .cells
            .iter()
            .filter(|c| c.cell.is_enabled && c.bounds.contains(point.latitude, point.longitude))
            .min_by_key(|c| c.cell.id)
            .map(|c| c.cell.clone()))
    }

    async fn find_nearest_within(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> KairosResult<Option<(Cell, f64)>> {
        self.check_online()?;
        let mut candidates: Vec<(&StoredCell, f64)> = self
            .cells
            .iter()
            .filter(|c| c.cell.is_enabled && distance_to_bounds_m(point, &c.bounds) <= radius_m)
            .map(|c| (c, point.distance_m(&bounds_center(&c.bounds))))
            .collect();
        candidates.sort_by(|(a, da), (b, db)| da.total_cmp(db).then(a.cell.id.cmp(&b.cell.id)));
        Ok(candidates
            .first()
            .map(|(c, distance)| (c.cell.clone(), *distance)))
    }

    async fn count_enabled(&self) -> KairosResult<i64> {
        self.check_online()?;
        Ok(self.cells.iter().filter(|c| c.cell.is_enabled).count() as i64)
    }
}

#[async_trait]
impl TileStore for InMemoryStore {
    async fn latest_run(&self, cell_id: i64) -> KairosResult<Option<RunId>> {
        self.check_cell(cell_id)?;
        let tiles = self.tiles.read().await;
        Ok(tiles
            .iter()
            .filter(|t| t.cell_id == cell_id)
            .map(|t| t.run())
            .max())
    }

    async fn run_tiles_from(
        &self,
        cell_id: i64,
        run: &RunId,
        from: DateTime<Utc>,
        limit: i64,
    ) -> KairosResult<Vec<ForecastTile>> {
        self.check_cell(cell_id)?;
        let tiles = self.tiles.read().await;
        let mut found: Vec<ForecastTile> = tiles
            .iter()
            .filter(|t| t.cell_id == cell_id && &t.run() == run && t.forecast_datetime >= from)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.forecast_datetime);
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn tiles_in_range(
        &self,
        cell_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<Vec<ForecastTile>> {
        self.check_cell(cell_id)?;
        let tiles = self.tiles.read().await;
        let mut newest: HashMap<DateTime<Utc>, &ForecastTile> = HashMap::new();
        for tile in tiles.iter().filter(|t| {
            t.cell_id == cell_id && t.forecast_datetime >= start && t.forecast_datetime <= end
        }) {
            newest
                .entry(tile.forecast_datetime)
                .and_modify(|current| {
                    if tile.run() > current.run() {
                        *current = tile;
                    }
                })
                .or_insert(tile);
        }
        let mut found: Vec<ForecastTile> = newest.into_values().cloned().collect();
        found.sort_by_key(|t| t.forecast_datetime);
        Ok(found)
    }

    async fn next_tile(
        &self,
        cell_id: i64,
        from: DateTime<Utc>,
    ) -> KairosResult<Option<ForecastTile>> {
        self.check_cell(cell_id)?;
        let tiles = self.tiles.read().await;
        Ok(tiles
            .iter()
            .filter(|t| t.cell_id == cell_id && t.forecast_datetime >= from)
            .min_by(|a, b| {
                a.forecast_datetime
                    .cmp(&b.forecast_datetime)
                    .then(b.run().cmp(&a.run()))
            })
            .cloned())
    }

    async fn upsert_tiles(&self, new_tiles: &[NewForecastTile]) -> KairosResult<u64> {
        self.check_online()?;
        let mut tiles = self.tiles.write().await;
        let now = Utc::now();
        for new in new_tiles {
            let existing = tiles.iter_mut().find(|t| {
                t.cell_id == new.cell_id
                    && t.forecast_datetime == new.forecast_datetime
                    && t.run() == new.run
            });
            match existing {
                Some(tile) => {
                    tile.forecast_data = new.forecast_data.clone();
                    tile.updated_at = now;
                }
                None => {
                    let id = tiles.iter().map(|t| t.id).max().unwrap_or(0) + 1;
                    tiles.push(ForecastTile {
                        id,
                        cell_id: new.cell_id,
                        run_date: new.run.run_date,
                        utc_cycle_time: new.run.cycle.clone(),
                        forecast_datetime: new.forecast_datetime,
                        forecast_data: new.forecast_data.clone(),
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
        }
        Ok(new_tiles.len() as u64)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> KairosResult<u64> {
        self.check_online()?;
        let mut tiles = self.tiles.write().await;
        let before = tiles.len();
        tiles.retain(|t| t.forecast_datetime >= cutoff);
        Ok((before - tiles.len()) as u64)
    }

    async fn data_status(&self) -> KairosResult<DataStatus> {
        self.check_online()?;
        let tiles = self.tiles.read().await;
        let cells: HashSet<i64> = tiles.iter().map(|t| t.cell_id).collect();
        Ok(DataStatus {
            tile_count: tiles.len() as i64,
            cells_with_data: cells.len() as i64,
            latest_run: tiles.iter().map(|t| t.run()).max(),
            last_update: tiles.iter().map(|t| t.updated_at).max(),
        })
    }
}
