//! Weather endpoints.
//!
//! All location-based routes accept either `city=` or `lat=` + `lon=`
//! (`lng=` works as an alias for `lon`).

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;

use forecast::UnitSystem;
use kairos_common::{BoundingBox, KairosError, KairosResult};

use super::{parse_f64, record_request, respond};
use crate::engine::{parse_city_list, parse_range_bounds};
use crate::resolver::LocationQuery;
use crate::state::AppState;
use crate::views::{
    AlertsView, BulkView, CitiesView, CurrentView, MapView, PrecipitationView, RangeView,
    WeatherView,
};

const DEFAULT_ZOOM: u8 = 8;
const MAX_ZOOM: u8 = 22;

/// Query parameters shared by the location-based weather routes.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    #[serde(alias = "lng")]
    pub lon: Option<String>,
    pub units: Option<String>,
    pub hours: Option<String>,
    pub days: Option<String>,
    /// `hourly` (default) or `daily`.
    #[serde(rename = "type")]
    pub forecast_type: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl WeatherParams {
    /// A non-empty `city` wins over coordinates.
    pub fn location(&self) -> KairosResult<LocationQuery> {
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(LocationQuery::City(city.to_string()));
        }

        match (self.lat.as_deref(), self.lon.as_deref()) {
            (Some(lat), Some(lon)) => Ok(LocationQuery::Coordinates {
                latitude: parse_f64("lat", lat)?,
                longitude: parse_f64("lon", lon)?,
            }),
            (Some(_), None) => Err(KairosError::MissingParameter("lon".to_string())),
            (None, Some(_)) => Err(KairosError::MissingParameter("lat".to_string())),
            (None, None) => Err(KairosError::MissingParameter(
                "city or lat/lon".to_string(),
            )),
        }
    }

    pub fn units(&self) -> KairosResult<UnitSystem> {
        UnitSystem::parse(self.units.as_deref())
    }
}

/// GET /weather - current conditions plus the hourly series
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Response {
    const ENDPOINT: &str = "weather";
    record_request(ENDPOINT);
    respond(ENDPOINT, hourly(&state, &params).await)
}

async fn hourly(state: &AppState, params: &WeatherParams) -> KairosResult<WeatherView> {
    let units = params.units()?;
    let query = params.location()?;
    let hours = state.engine.hours(params.hours.as_deref());

    let point = state.engine.point(&query, hours, Utc::now()).await?;
    Ok(WeatherView::new(&point, units, &state.config.coverage.model))
}

/// GET /weather/current
pub async fn current_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Response {
    const ENDPOINT: &str = "weather_current";
    record_request(ENDPOINT);

    respond(ENDPOINT, current(&state, &params).await)
}

async fn current(state: &AppState, params: &WeatherParams) -> KairosResult<CurrentView> {
    let units = params.units()?;
    let query = params.location()?;
    let point = state.engine.point(&query, 1, Utc::now()).await?;
    Ok(CurrentView::new(&point, units, &state.config.coverage.model))
}

/// GET /weather/forecast?type=hourly|daily
pub async fn forecast_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Response {
    const ENDPOINT: &str = "weather_forecast";
    record_request(ENDPOINT);

    let kind = params
        .forecast_type
        .as_deref()
        .map(|t| t.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match kind.as_str() {
        "" | "hourly" => respond(ENDPOINT, hourly(&state, &params).await),
        "daily" => respond(ENDPOINT, daily(&state, &params).await),
        other => respond::<RangeView>(
            ENDPOINT,
            Err(KairosError::invalid(
                "type",
                format!("expected 'hourly' or 'daily', got '{}'", other),
            )),
        ),
    }
}

async fn daily(state: &AppState, params: &WeatherParams) -> KairosResult<RangeView> {
    let units = params.units()?;
    let query = params.location()?;
    let days = state.engine.days(params.days.as_deref());
    let range = state.engine.daily(&query, days, Utc::now()).await?;
    Ok(RangeView::new(&range, units))
}

/// GET /weather/range?start=&end=
pub async fn range_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Response {
    const ENDPOINT: &str = "weather_range";
    record_request(ENDPOINT);

    respond(ENDPOINT, range(&state, &params).await)
}

async fn range(state: &AppState, params: &WeatherParams) -> KairosResult<RangeView> {
    let units = params.units()?;
    let query = params.location()?;
    let (start, end) = parse_range_bounds(
        params.start.as_deref(),
        params.end.as_deref(),
        Utc::now(),
        state.config.query.default_range_days,
    )?;
    let range = state.engine.range(&query, start, end).await?;
    Ok(RangeView::new(&range, units))
}

#[derive(Debug, Deserialize)]
pub struct BulkParams {
    pub cities: Option<String>,
    pub units: Option<String>,
    pub hours: Option<String>,
}

/// GET /weather/bulk?cities=A,B,C
///
/// Always 200 once the parameters are valid; per-city failures are reported
/// inline.
pub async fn bulk_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<BulkParams>,
) -> Response {
    const ENDPOINT: &str = "weather_bulk";
    record_request(ENDPOINT);

    respond(ENDPOINT, bulk(&state, &params).await)
}

async fn bulk(state: &AppState, params: &BulkParams) -> KairosResult<BulkView> {
    let units = UnitSystem::parse(params.units.as_deref())?;
    let cities = parse_city_list(params.cities.as_deref(), state.config.query.max_bulk_cities)?;
    let hours = state.engine.hours(params.hours.as_deref());

    let entries = state.engine.bulk(cities, hours, Utc::now()).await;
    Ok(BulkView::new(&entries, units, &state.config.coverage.model))
}

#[derive(Debug, Deserialize)]
pub struct CitiesParams {
    pub units: Option<String>,
}

/// GET /weather/cities - next-hour temperature for every enabled city
pub async fn cities_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CitiesParams>,
) -> Response {
    const ENDPOINT: &str = "weather_cities";
    record_request(ENDPOINT);

    respond(ENDPOINT, cities(&state, &params).await)
}

async fn cities(state: &AppState, params: &CitiesParams) -> KairosResult<CitiesView> {
    let units = UnitSystem::parse(params.units.as_deref())?;
    let snapshot = state.engine.temperature_snapshot(Utc::now()).await?;
    Ok(CitiesView::new(&snapshot, units))
}

#[derive(Debug, Deserialize)]
pub struct PrecipitationParams {
    pub threshold: Option<String>,
    pub hours: Option<String>,
}

/// GET /weather/precipitation?threshold=&hours=
pub async fn precipitation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PrecipitationParams>,
) -> Response {
    const ENDPOINT: &str = "weather_precipitation";
    record_request(ENDPOINT);

    let threshold = state.engine.threshold(params.threshold.as_deref());
    let hours = state.engine.hours(params.hours.as_deref());

    let result = state
        .engine
        .precipitation_search(threshold, hours, Utc::now())
        .await
        .map(|places| PrecipitationView::new(threshold, hours, &places));
    respond(ENDPOINT, result)
}

#[derive(Debug, Deserialize)]
pub struct MapParams {
    pub bbox: Option<String>,
    pub zoom: Option<String>,
}

fn parse_map_params(params: &MapParams) -> KairosResult<(BoundingBox, u8)> {
    let raw = params
        .bbox
        .as_deref()
        .ok_or_else(|| KairosError::MissingParameter("bbox".to_string()))?;
    let bbox = BoundingBox::from_query_string(raw)
        .map_err(|e| KairosError::invalid("bbox", e.to_string()))?;

    let zoom = match params.zoom.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_ZOOM,
        Some(z) => z
            .parse::<u8>()
            .ok()
            .filter(|z| *z <= MAX_ZOOM)
            .ok_or_else(|| {
                KairosError::invalid("zoom", format!("expected 0-{}, got '{}'", MAX_ZOOM, z))
            })?,
    };
    Ok((bbox, zoom))
}

/// GET /weather/map?bbox=S,W,N,E&zoom=
pub async fn map_handler(Query(params): Query<MapParams>) -> Response {
    const ENDPOINT: &str = "weather_map";
    record_request(ENDPOINT);
    respond(
        ENDPOINT,
        parse_map_params(&params).map(|(bbox, zoom)| MapView::new(bbox, zoom)),
    )
}

#[derive(Debug, Deserialize)]
pub struct AlertsParams {
    pub region: Option<String>,
}

/// GET /weather/alerts
pub async fn alerts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AlertsParams>,
) -> Response {
    const ENDPOINT: &str = "weather_alerts";
    record_request(ENDPOINT);

    let region = params
        .region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| state.config.coverage.region.clone());
    respond::<AlertsView>(
        ENDPOINT,
        Ok(AlertsView {
            region,
            alerts: Vec::new(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(city: Option<&str>, lat: Option<&str>, lon: Option<&str>) -> WeatherParams {
        WeatherParams {
            city: city.map(str::to_string),
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_city_wins_over_coordinates() {
        let p = params(Some(" Athens "), Some("40.0"), Some("22.0"));
        assert_eq!(p.location().unwrap(), LocationQuery::City("Athens".into()));
    }

    #[test]
    fn test_coordinates() {
        let p = params(None, Some("37.98"), Some("23.72"));
        assert_eq!(
            p.location().unwrap(),
            LocationQuery::Coordinates {
                latitude: 37.98,
                longitude: 23.72
            }
        );
    }

    #[test]
    fn test_missing_location() {
        let err = params(Some("  "), None, None).location().unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert!(matches!(
            params(None, Some("37.9"), None).location(),
            Err(KairosError::MissingParameter(p)) if p == "lon"
        ));
    }

    #[test]
    fn test_bad_latitude_text() {
        let err = params(None, Some("north"), Some("23.7")).location().unwrap_err();
        assert!(err.to_string().contains("lat"));
    }

    #[test]
    fn test_map_params() {
        let (bbox, zoom) = parse_map_params(&MapParams {
            bbox: Some("34,19,42,30".to_string()),
            zoom: None,
        })
        .unwrap();
        assert_eq!(bbox.to_array(), [34.0, 19.0, 42.0, 30.0]);
        assert_eq!(zoom, DEFAULT_ZOOM);

        assert!(parse_map_params(&MapParams {
            bbox: Some("42,19,34,30".to_string()),
            zoom: None,
        })
        .is_err());
        assert!(parse_map_params(&MapParams {
            bbox: Some("34,19,42,30".to_string()),
            zoom: Some("99".to_string()),
        })
        .is_err());
        assert!(matches!(
            parse_map_params(&MapParams { bbox: None, zoom: None }),
            Err(KairosError::MissingParameter(_))
        ));
    }
}
