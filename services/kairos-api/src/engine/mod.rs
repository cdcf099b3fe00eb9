//! Forecast query and aggregation engine.
//!
//! Every query takes `now` explicitly; handlers pass `Utc::now()` and tests
//! pin the clock.

mod aggregate;
mod bulk;
mod point;
mod range;
mod snapshot;
mod threshold;

pub use aggregate::{aggregate_daily, DailyAggregate};
pub use bulk::{parse_city_list, BulkEntry};
pub use point::PointForecast;
pub use range::{parse_range_bounds, RangeForecast};
pub use snapshot::CityTemperature;
pub use threshold::PlacePrecipitation;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use futures::stream::{self, StreamExt};

use storage::{CellStore, GeoEntityStore, TileStore};

use crate::config::QueryConfig;
use crate::resolver::LocationResolver;

/// Parse a count parameter: missing, unparsable or non-positive values give
/// `default`, larger values clamp to `max`.
pub fn clamp_count(raw: Option<&str>, default: i64, max: i64) -> i64 {
    match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) if n > 0 => n.min(max),
        _ => default,
    }
}

/// Start of the hour containing `now`.
pub(crate) fn hour_floor(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::hours(1)).unwrap_or(now)
}

/// Runs queries against the stores handed in at construction.
pub struct QueryEngine {
    places: Arc<dyn GeoEntityStore>,
    cells: Arc<dyn CellStore>,
    tiles: Arc<dyn TileStore>,
    resolver: Arc<LocationResolver>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(
        places: Arc<dyn GeoEntityStore>,
        cells: Arc<dyn CellStore>,
        tiles: Arc<dyn TileStore>,
        resolver: Arc<LocationResolver>,
        config: QueryConfig,
    ) -> Self {
        Self {
            places,
            cells,
            tiles,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    /// Clamp an `hours` parameter to the configured limits.
    pub fn hours(&self, raw: Option<&str>) -> i64 {
        clamp_count(raw, self.config.default_hours, self.config.max_hours)
    }

    /// Clamp a `days` parameter to the configured limits.
    pub fn days(&self, raw: Option<&str>) -> i64 {
        clamp_count(raw, self.config.default_days, self.config.max_days)
    }

    /// Parse a precipitation threshold in mm/h; invalid or non-positive
    /// values give the configured default.
    pub fn threshold(&self, raw: Option<&str>) -> f64 {
        match raw.and_then(|s| s.trim().parse::<f64>().ok()) {
            Some(t) if t.is_finite() && t > 0.0 => t,
            _ => self.config.default_threshold,
        }
    }

    /// Apply `f` to every item with bounded concurrency, keeping input order.
    async fn fan_out<T, R, F, Fut>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        stream::iter(items)
            .map(f)
            .buffered(self.config.fan_out_concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(None, 24, 120), 24);
        assert_eq!(clamp_count(Some("48"), 24, 120), 48);
        assert_eq!(clamp_count(Some(" 6 "), 24, 120), 6);
        assert_eq!(clamp_count(Some("500"), 24, 120), 120);
        assert_eq!(clamp_count(Some("0"), 24, 120), 24);
        assert_eq!(clamp_count(Some("-5"), 24, 120), 24);
        assert_eq!(clamp_count(Some("soon"), 24, 120), 24);
    }

    #[test]
    fn test_hour_floor() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 59, 59).unwrap();
        assert_eq!(
            hour_floor(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
        );
    }
}
