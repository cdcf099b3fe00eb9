//! PostgreSQL/PostGIS implementation of [`CellStore`].

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use kairos_common::{Cell, GeoPoint, KairosError, KairosResult};

use crate::store::CellStore;

const CELL_COLUMNS: &str = "id, cell_name, is_enabled, \
     ST_Y(ST_Centroid(boundary::geometry)) AS latitude, \
     ST_X(ST_Centroid(boundary::geometry)) AS longitude";

pub struct PgCellStore {
    pool: PgPool,
}

impl PgCellStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CellStore for PgCellStore {
    async fn find_by_id(&self, id: i64) -> KairosResult<Option<Cell>> {
        let row = sqlx::query_as::<_, CellRow>(&format!(
            "SELECT {} FROM icon_cells WHERE id = $1",
            CELL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    #[instrument(skip(self))]
    async fn find_containing(&self, point: GeoPoint) -> KairosResult<Option<Cell>> {
        let row = sqlx::query_as::<_, CellRow>(&format!(
            "SELECT {} FROM icon_cells \
             WHERE is_enabled \
               AND ST_Contains(boundary::geometry, ST_SetSRID(ST_MakePoint($1, $2), 4326)) \
             ORDER BY id ASC LIMIT 1",
            CELL_COLUMNS
        ))
        .bind(point.longitude)
        .bind(point.latitude)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    #[instrument(skip(self))]
    async fn find_nearest_within(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> KairosResult<Option<(Cell, f64)>> {
        let row = sqlx::query_as::<_, NearestCellRow>(&format!(
            "SELECT {}, \
                ST_Distance(ST_Centroid(boundary::geometry)::geography, \
                            ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_m \
             FROM icon_cells \
             WHERE is_enabled \
               AND ST_DWithin(boundary, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY distance_m ASC, id ASC LIMIT 1",
            CELL_COLUMNS
        ))
        .bind(point.longitude)
        .bind(point.latitude)
        .bind(radius_m)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| {
            let distance = r.distance_m;
            (r.cell.into(), distance)
        }))
    }

    async fn count_enabled(&self) -> KairosResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM icon_cells WHERE is_enabled")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))
    }
}

/// Internal row type for database queries.
#[derive(FromRow)]
struct CellRow {
    id: i64,
    cell_name: String,
    is_enabled: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(FromRow)]
struct NearestCellRow {
    #[sqlx(flatten)]
    cell: CellRow,
    distance_m: f64,
}

impl From<CellRow> for Cell {
    fn from(row: CellRow) -> Self {
        let centroid = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        Cell {
            id: row.id,
            name: row.cell_name,
            is_enabled: row.is_enabled,
            centroid,
        }
    }
}
