use chrono::{DateTime, Utc};
use tracing::instrument;

use forecast::NormalizedForecast;
use kairos_common::{KairosError, KairosResult, RunId};

use super::{hour_floor, QueryEngine};
use crate::resolver::{LocationQuery, Resolution};

/// Hourly series from the latest run of one cell.
#[derive(Debug, Clone)]
pub struct PointForecast {
    pub resolution: Resolution,
    pub run: RunId,
    /// Ascending by forecast instant; never empty.
    pub forecasts: Vec<NormalizedForecast>,
}

impl PointForecast {
    /// The earliest entry of the series.
    pub fn current(&self) -> &NormalizedForecast {
        &self.forecasts[0]
    }
}

impl QueryEngine {
    /// Resolve a location and fetch up to `hours` tiles from the current
    /// hour onwards.
    pub async fn point(
        &self,
        query: &LocationQuery,
        hours: i64,
        now: DateTime<Utc>,
    ) -> KairosResult<PointForecast> {
        let resolution = self.resolver.resolve(query).await?;
        self.point_for(resolution, hours, now).await
    }

    #[instrument(skip(self, resolution), fields(cell_id = resolution.cell.id))]
    pub async fn point_for(
        &self,
        resolution: Resolution,
        hours: i64,
        now: DateTime<Utc>,
    ) -> KairosResult<PointForecast> {
        let cell_id = resolution.cell.id;
        let run = self.tiles.latest_run(cell_id).await?.ok_or_else(|| {
            KairosError::NoForecastData(format!("no runs for {}", resolution.label()))
        })?;

        let tiles = self
            .tiles
            .run_tiles_from(cell_id, &run, hour_floor(now), hours)
            .await?;
        if tiles.is_empty() {
            return Err(KairosError::NoForecastData(format!(
                "run {} has no upcoming forecasts for {}",
                run,
                resolution.label()
            )));
        }

        let forecasts = tiles.iter().map(NormalizedForecast::from_tile).collect();
        Ok(PointForecast {
            resolution,
            run,
            forecasts,
        })
    }
}
