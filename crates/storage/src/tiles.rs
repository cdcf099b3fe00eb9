//! PostgreSQL implementation of [`TileStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use kairos_common::{ForecastTile, KairosError, KairosResult, NewForecastTile, RunId};

use crate::store::{DataStatus, TileStore};

const TILE_COLUMNS: &str = "id, cell_id, run_date, utc_cycle_time, forecast_datetime, \
     forecast_data::text AS forecast_data, created_at, updated_at";

pub struct PgTileStore {
    pool: PgPool,
}

impl PgTileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TileStore for PgTileStore {
    #[instrument(skip(self))]
    async fn latest_run(&self, cell_id: i64) -> KairosResult<Option<RunId>> {
        let row = sqlx::query_as::<_, RunRow>(
            "SELECT run_date, utc_cycle_time FROM icon_tile_forecasts \
             WHERE cell_id = $1 \
             ORDER BY run_date DESC, utc_cycle_time DESC LIMIT 1",
        )
        .bind(cell_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    #[instrument(skip(self, run), fields(run = %run))]
    async fn run_tiles_from(
        &self,
        cell_id: i64,
        run: &RunId,
        from: DateTime<Utc>,
        limit: i64,
    ) -> KairosResult<Vec<ForecastTile>> {
        let rows = sqlx::query_as::<_, TileRow>(&format!(
            "SELECT {} FROM icon_tile_forecasts \
             WHERE cell_id = $1 AND run_date = $2 AND utc_cycle_time = $3 \
               AND forecast_datetime >= $4 \
             ORDER BY forecast_datetime ASC LIMIT $5",
            TILE_COLUMNS
        ))
        .bind(cell_id)
        .bind(run.run_date)
        .bind(&run.cycle)
        .bind(from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        rows.into_iter().map(ForecastTile::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn tiles_in_range(
        &self,
        cell_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<Vec<ForecastTile>> {
        let rows = sqlx::query_as::<_, TileRow>(&format!(
            "SELECT DISTINCT ON (forecast_datetime) {} FROM icon_tile_forecasts \
             WHERE cell_id = $1 AND forecast_datetime >= $2 AND forecast_datetime <= $3 \
             ORDER BY forecast_datetime ASC, run_date DESC, utc_cycle_time DESC",
            TILE_COLUMNS
        ))
        .bind(cell_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        rows.into_iter().map(ForecastTile::try_from).collect()
    }

    async fn next_tile(
        &self,
        cell_id: i64,
        from: DateTime<Utc>,
    ) -> KairosResult<Option<ForecastTile>> {
        let row = sqlx::query_as::<_, TileRow>(&format!(
            "SELECT {} FROM icon_tile_forecasts \
             WHERE cell_id = $1 AND forecast_datetime >= $2 \
             ORDER BY forecast_datetime ASC, run_date DESC, utc_cycle_time DESC LIMIT 1",
            TILE_COLUMNS
        ))
        .bind(cell_id)
        .bind(from)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        row.map(ForecastTile::try_from).transpose()
    }

    async fn upsert_tiles(&self, tiles: &[NewForecastTile]) -> KairosResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Transaction failed: {}", e)))?;

        let mut written = 0;
        for tile in tiles {
            let payload = serde_json::to_string(&tile.forecast_data)?;
            let result = sqlx::query(
                r#"
                INSERT INTO icon_tile_forecasts (
                    cell_id, run_date, utc_cycle_time, forecast_datetime, forecast_data
                ) VALUES ($1, $2, $3, $4, $5::jsonb)
                ON CONFLICT (cell_id, forecast_datetime, run_date, utc_cycle_time)
                DO UPDATE SET
                    forecast_data = EXCLUDED.forecast_data,
                    updated_at = NOW()
                "#,
            )
            .bind(tile.cell_id)
            .bind(tile.run.run_date)
            .bind(&tile.run.cycle)
            .bind(tile.forecast_datetime)
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Insert failed: {}", e)))?;
            written += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Commit failed: {}", e)))?;

        debug!(tiles = tiles.len(), written, "Upserted forecast tiles");
        Ok(written)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> KairosResult<u64> {
        let result = sqlx::query("DELETE FROM icon_tile_forecasts WHERE forecast_datetime < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Delete failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn data_status(&self) -> KairosResult<DataStatus> {
        let counts = sqlx::query_as::<_, StatusRow>(
            "SELECT COUNT(*) AS tile_count, COUNT(DISTINCT cell_id) AS cells_with_data, \
                    MAX(updated_at) AS last_update \
             FROM icon_tile_forecasts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        let latest = sqlx::query_as::<_, RunRow>(
            "SELECT run_date, utc_cycle_time FROM icon_tile_forecasts \
             ORDER BY run_date DESC, utc_cycle_time DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(DataStatus {
            tile_count: counts.tile_count,
            cells_with_data: counts.cells_with_data,
            latest_run: latest.map(|r| r.into()),
            last_update: counts.last_update,
        })
    }
}

/// Internal row type for database queries.
#[derive(FromRow)]
struct TileRow {
    id: i64,
    cell_id: i64,
    run_date: NaiveDate,
    utc_cycle_time: String,
    forecast_datetime: DateTime<Utc>,
    forecast_data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TileRow> for ForecastTile {
    type Error = KairosError;

    fn try_from(row: TileRow) -> Result<Self, Self::Error> {
        let forecast_data: Map<String, Value> =
            serde_json::from_str(&row.forecast_data).map_err(|e| {
                KairosError::DatabaseError(format!("Tile {} has malformed payload: {}", row.id, e))
            })?;

        Ok(ForecastTile {
            id: row.id,
            cell_id: row.cell_id,
            run_date: row.run_date,
            utc_cycle_time: row.utc_cycle_time,
            forecast_datetime: row.forecast_datetime,
            forecast_data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RunRow {
    run_date: NaiveDate,
    utc_cycle_time: String,
}

impl From<RunRow> for RunId {
    fn from(row: RunRow) -> Self {
        RunId {
            run_date: row.run_date,
            cycle: row.utc_cycle_time,
        }
    }
}

#[derive(FromRow)]
struct StatusRow {
    tile_count: i64,
    cells_with_data: i64,
    last_update: Option<DateTime<Utc>>,
}
