//! Forecast tiles and model runs.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KairosError, KairosResult};

/// Model initialization: calendar date plus two-digit UTC cycle hour.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub run_date: NaiveDate,
    pub cycle: String,
}

impl RunId {
    pub fn new(run_date: NaiveDate, cycle_hour: u32) -> KairosResult<Self> {
        if cycle_hour > 23 {
            return Err(KairosError::invalid(
                "run",
                format!("cycle hour must be 0-23, got {}", cycle_hour),
            ));
        }
        Ok(Self {
            run_date,
            cycle: format!("{:02}", cycle_hour),
        })
    }

    /// Parse the compact `YYYYMMDDHH` form.
    pub fn from_compact(s: &str) -> KairosResult<Self> {
        let s = s.trim();
        if s.len() != 10 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(KairosError::invalid(
                "run",
                format!("expected YYYYMMDDHH, got '{}'", s),
            ));
        }
        let run_date = NaiveDate::parse_from_str(&s[..8], "%Y%m%d")
            .map_err(|e| KairosError::invalid("run", format!("bad date in '{}': {}", s, e)))?;
        let hour: u32 = s[8..]
            .parse()
            .map_err(|_| KairosError::invalid("run", format!("bad hour in '{}'", s)))?;
        Self::new(run_date, hour)
    }

    pub fn to_compact(&self) -> String {
        format!("{}{}", self.run_date.format("%Y%m%d"), self.cycle)
    }

    pub fn cycle_hour(&self) -> u32 {
        self.cycle.parse().unwrap_or(0)
    }

    /// Initialization instant of the run.
    pub fn init_time(&self) -> DateTime<Utc> {
        let naive = self
            .run_date
            .and_hms_opt(self.cycle_hour(), 0, 0)
            .unwrap_or_else(|| self.run_date.and_time(chrono::NaiveTime::MIN));
        Utc.from_utc_datetime(&naive)
    }

    /// Most recent run expected to be published at `now`.
    ///
    /// Runs start every 3 hours and take roughly 6 hours to appear upstream.
    pub fn latest_available(now: DateTime<Utc>) -> Self {
        let floored = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let floored = floored - Duration::hours(i64::from(floored.hour() % 3));
        let run_time = floored - Duration::hours(6);
        Self {
            run_date: run_time.date_naive(),
            cycle: format!("{:02}", run_time.hour()),
        }
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_compact())
    }
}

/// One stored forecast payload for one cell, one run, one target instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTile {
    pub id: i64,
    pub cell_id: i64,
    pub run_date: NaiveDate,
    pub utc_cycle_time: String,
    pub forecast_datetime: DateTime<Utc>,
    /// Raw variable-keyed payload; the key set varies by model export.
    pub forecast_data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ForecastTile {
    pub fn run(&self) -> RunId {
        RunId {
            run_date: self.run_date,
            cycle: self.utc_cycle_time.clone(),
        }
    }
}

/// A tile ready for insertion by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForecastTile {
    pub cell_id: i64,
    pub run: RunId,
    pub forecast_datetime: DateTime<Utc>,
    pub forecast_data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_round_trip() {
        let run = RunId::from_compact("2024061512").unwrap();
        assert_eq!(run.run_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(run.cycle, "12");
        assert_eq!(run.to_compact(), "2024061512");
    }

    #[test]
    fn test_compact_rejects_garbage() {
        assert!(RunId::from_compact("20240615").is_err());
        assert!(RunId::from_compact("2024061525").is_err());
        assert!(RunId::from_compact("2024x61512").is_err());
    }

    #[test]
    fn test_latest_available_floors_and_lags() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 14, 37, 12).unwrap();
        let run = RunId::latest_available(now);
        // 14:37 floors to 12:00, minus 6h
        assert_eq!(run.to_compact(), "2024061506");
    }

    #[test]
    fn test_latest_available_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 2, 5, 0).unwrap();
        assert_eq!(RunId::latest_available(now).to_compact(), "2024061418");
    }

    #[test]
    fn test_runs_order_by_date_then_cycle() {
        let a = RunId::from_compact("2024061418").unwrap();
        let b = RunId::from_compact("2024061500").unwrap();
        let c = RunId::from_compact("2024061506").unwrap();
        assert!(a < b && b < c);
    }
}
