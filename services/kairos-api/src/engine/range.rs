use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::instrument;

use forecast::NormalizedForecast;
use kairos_common::{KairosError, KairosResult};

use super::{aggregate_daily, hour_floor, DailyAggregate, QueryEngine};
use crate::resolver::{LocationQuery, Resolution};

/// Daily aggregates over an explicit window.
#[derive(Debug, Clone)]
pub struct RangeForecast {
    pub resolution: Resolution,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: Vec<DailyAggregate>,
}

fn parse_bound(param: &str, raw: &str, end_of_day: bool) -> KairosResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
        } else {
            NaiveTime::MIN
        };
        return Ok(date.and_time(time).and_utc());
    }
    Err(KairosError::invalid(
        param,
        format!("expected RFC 3339 or YYYY-MM-DD, got '{}'", raw),
    ))
}

/// Parse `start`/`end` query values. Missing values default to `now` and
/// `now + default_days`; a date-only `end` covers that whole day.
pub fn parse_range_bounds(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
    default_days: i64,
) -> KairosResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match start.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_bound("start", raw, false)?,
        None => now,
    };
    let end = match end.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_bound("end", raw, true)?,
        None => now + Duration::days(default_days),
    };

    if start > end {
        return Err(KairosError::invalid(
            "start",
            format!("start {} is after end {}", start.to_rfc3339(), end.to_rfc3339()),
        ));
    }
    Ok((start, end))
}

impl QueryEngine {
    /// Resolve a location and aggregate every tile in `[start, end]` by day.
    pub async fn range(
        &self,
        query: &LocationQuery,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<RangeForecast> {
        let resolution = self.resolver.resolve(query).await?;
        self.range_for(resolution, start, end).await
    }

    #[instrument(skip(self, resolution), fields(cell_id = resolution.cell.id))]
    pub async fn range_for(
        &self,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> KairosResult<RangeForecast> {
        let tiles = self
            .tiles
            .tiles_in_range(resolution.cell.id, start, end)
            .await?;
        if tiles.is_empty() {
            return Err(KairosError::NoForecastData(format!(
                "no forecasts for {} between {} and {}",
                resolution.label(),
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        let forecasts = tiles.iter().map(NormalizedForecast::from_tile).collect();
        Ok(RangeForecast {
            resolution,
            start,
            end,
            days: aggregate_daily(forecasts),
        })
    }

    /// Daily view from the current hour over the next `days` days.
    pub async fn daily(
        &self,
        query: &LocationQuery,
        days: i64,
        now: DateTime<Utc>,
    ) -> KairosResult<RangeForecast> {
        let start = hour_floor(now);
        self.range(query, start, start + Duration::days(days)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let (start, end) = parse_range_bounds(None, None, now(), 5).unwrap();
        assert_eq!(start, now());
        assert_eq!(end, now() + Duration::days(5));
    }

    #[test]
    fn test_date_only_end_covers_day() {
        let (start, end) =
            parse_range_bounds(Some("2024-05-11"), Some("2024-05-12"), now(), 5).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 5, 12, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let (start, _) =
            parse_range_bounds(Some("2024-05-11T03:00:00+03:00"), None, now(), 5).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_start_after_end_rejected() {
        let err = parse_range_bounds(Some("2024-05-12"), Some("2024-05-11"), now(), 5).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_same_day_is_valid() {
        assert!(parse_range_bounds(Some("2024-05-11"), Some("2024-05-11"), now(), 5).is_ok());
    }

    #[test]
    fn test_garbage_rejected() {
        let err = parse_range_bounds(Some("yesterday"), None, now(), 5).unwrap_err();
        assert!(err.to_string().contains("start"));
    }
}
