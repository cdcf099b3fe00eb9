use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use forecast::NormalizedForecast;
use kairos_common::{Cell, GeoEntity, KairosResult};

use super::QueryEngine;

/// A city with at least one hour above the precipitation threshold.
#[derive(Debug, Clone)]
pub struct PlacePrecipitation {
    pub place: GeoEntity,
    pub cell: Cell,
    /// Distance from the place centroid to the matched cell, meters.
    pub distance_m: f64,
    /// Highest hourly rate in `forecasts`, mm/h.
    pub peak: f64,
    /// Matching hours, wettest first.
    pub forecasts: Vec<NormalizedForecast>,
}

impl QueryEngine {
    /// Cities expecting more than `threshold` mm/h within `hours` of `now`,
    /// wettest first.
    #[instrument(skip(self))]
    pub async fn precipitation_search(
        &self,
        threshold: f64,
        hours: i64,
        now: DateTime<Utc>,
    ) -> KairosResult<Vec<PlacePrecipitation>> {
        let cities = self.places.enabled_cities().await?;
        let end = now + Duration::hours(hours);

        let scanned = self
            .fan_out(cities, |place| self.scan_city(place, threshold, now, end))
            .await;

        let mut places: Vec<PlacePrecipitation> = scanned
            .into_iter()
            .collect::<KairosResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        places.sort_by(|a, b| b.peak.total_cmp(&a.peak));
        Ok(places)
    }

    async fn scan_city(
        &self,
        place: GeoEntity,
        threshold: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<Option<PlacePrecipitation>> {
        let Some(centroid) = place.centroid else {
            return Ok(None);
        };
        let Some((cell, distance_m)) = self
            .cells
            .find_nearest_within(centroid, self.config.proximity_radius_m)
            .await?
        else {
            debug!(place_id = place.id, "No cell within radius");
            return Ok(None);
        };

        let tiles = self.tiles.tiles_in_range(cell.id, start, end).await?;
        let mut forecasts: Vec<NormalizedForecast> = tiles
            .iter()
            .map(NormalizedForecast::from_tile)
            .filter(|f| f.precipitation > threshold)
            .collect();
        if forecasts.is_empty() {
            return Ok(None);
        }

        forecasts.sort_by(|a, b| b.precipitation.total_cmp(&a.precipitation));
        let peak = forecasts[0].precipitation;
        Ok(Some(PlacePrecipitation {
            place,
            cell,
            distance_m,
            peak,
            forecasts,
        }))
    }
}
