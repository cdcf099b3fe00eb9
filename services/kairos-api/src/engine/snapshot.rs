use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use forecast::NormalizedForecast;
use kairos_common::{Cell, GeoEntity, KairosResult};

use super::QueryEngine;

/// Next upcoming reading for one city.
#[derive(Debug, Clone)]
pub struct CityTemperature {
    pub place: GeoEntity,
    pub cell: Cell,
    pub forecast: NormalizedForecast,
}

impl QueryEngine {
    /// Next-hour temperature for every enabled city, warmest first.
    ///
    /// A city drops out silently when it has no nearby cell, no upcoming
    /// tile, no valid temperature, or any store call for it fails. Only a
    /// failure to list the cities is an error.
    #[instrument(skip(self))]
    pub async fn temperature_snapshot(
        &self,
        now: DateTime<Utc>,
    ) -> KairosResult<Vec<CityTemperature>> {
        let cities = self.places.enabled_cities().await?;

        let readings = self
            .fan_out(cities, |place| self.snapshot_city(place, now))
            .await;

        let mut cities: Vec<CityTemperature> = readings.into_iter().flatten().collect();
        cities.sort_by(|a, b| {
            b.forecast
                .temperature
                .kelvin
                .total_cmp(&a.forecast.temperature.kelvin)
        });
        Ok(cities)
    }

    async fn snapshot_city(
        &self,
        place: GeoEntity,
        now: DateTime<Utc>,
    ) -> Option<CityTemperature> {
        let centroid = place.centroid?;
        let (cell, _) = match self
            .cells
            .find_nearest_within(centroid, self.config.proximity_radius_m)
            .await
        {
            Ok(found) => found?,
            Err(e) => {
                debug!(place_id = place.id, error = %e, "Snapshot cell lookup failed");
                return None;
            }
        };
        let tile = match self.tiles.next_tile(cell.id, now).await {
            Ok(tile) => tile?,
            Err(e) => {
                debug!(place_id = place.id, error = %e, "Snapshot tile lookup failed");
                return None;
            }
        };

        let forecast = NormalizedForecast::from_tile(&tile);
        forecast.has_valid_temperature().then_some(CityTemperature {
            place,
            cell,
            forecast,
        })
    }
}
