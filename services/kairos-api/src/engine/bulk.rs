use chrono::{DateTime, Utc};
use tracing::{info, warn};

use kairos_common::{ErrorKind, KairosError, KairosResult};

use super::{PointForecast, QueryEngine};
use crate::resolver::LocationQuery;

/// Outcome for one requested city.
#[derive(Debug)]
pub struct BulkEntry {
    /// The name as requested (trimmed).
    pub city: String,
    pub outcome: KairosResult<PointForecast>,
}

/// Split a comma-separated city list. Names are trimmed and empty entries
/// dropped; an empty result or more than `max` names is a bad request.
pub fn parse_city_list(raw: Option<&str>, max: usize) -> KairosResult<Vec<String>> {
    let raw = raw.ok_or_else(|| KairosError::MissingParameter("cities".to_string()))?;
    let cities: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if cities.is_empty() {
        return Err(KairosError::MissingParameter("cities".to_string()));
    }
    if cities.len() > max {
        return Err(KairosError::invalid(
            "cities",
            format!("at most {} cities per request, got {}", max, cities.len()),
        ));
    }
    Ok(cities)
}

impl QueryEngine {
    /// Point query for every city, isolated per entry and in input order.
    pub async fn bulk(
        &self,
        cities: Vec<String>,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Vec<BulkEntry> {
        let requested = cities.len();
        let entries = self
            .fan_out(cities, |city| self.bulk_entry(city, hours, now))
            .await;

        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        info!(requested, failed, "Bulk query complete");
        entries
    }

    async fn bulk_entry(&self, city: String, hours: i64, now: DateTime<Utc>) -> BulkEntry {
        let query = LocationQuery::City(city.clone());
        let outcome = self.point(&query, hours, now).await;
        if let Err(e) = &outcome {
            if e.kind() == ErrorKind::Internal {
                warn!(city = %city, error = %e, "Bulk entry failed");
            }
        }
        BulkEntry { city, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_city_list() {
        let cities = parse_city_list(Some(" Athens, ,Thessaloniki ,,Patras"), 50).unwrap();
        assert_eq!(cities, vec!["Athens", "Thessaloniki", "Patras"]);
    }

    #[test]
    fn test_parse_city_list_missing() {
        assert!(matches!(
            parse_city_list(None, 50),
            Err(KairosError::MissingParameter(_))
        ));
        assert!(matches!(
            parse_city_list(Some(" , "), 50),
            Err(KairosError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_parse_city_list_too_many() {
        let err = parse_city_list(Some("a,b,c"), 2).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_duplicates_kept() {
        let cities = parse_city_list(Some("Athens,Athens"), 50).unwrap();
        assert_eq!(cities.len(), 2);
    }
}
