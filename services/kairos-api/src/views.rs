//! JSON response bodies.
//!
//! Engine results are unit-agnostic (SI plus °C); conversion to the
//! requested unit system happens only here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use forecast::{DataQualityTier, NormalizedForecast, Temperature, UnitSystem, WeatherCondition};
use kairos_common::{BoundingBox, GeoEntity, GeoPoint, RunId};

use crate::engine::{
    BulkEntry, CityTemperature, DailyAggregate, PlacePrecipitation, PointForecast, RangeForecast,
};
use crate::resolver::Resolution;

#[derive(Debug, Serialize)]
pub struct TemperatureView {
    pub value: f64,
    pub unit: &'static str,
    pub celsius: f64,
    pub kelvin: f64,
}

impl TemperatureView {
    pub fn new(t: &Temperature, units: UnitSystem) -> Self {
        Self {
            value: units.temperature(t),
            unit: units.temperature_unit(),
            celsius: t.celsius,
            kelvin: t.kelvin,
        }
    }
}

/// A value with its unit label.
#[derive(Debug, Serialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WindView {
    pub speed: f64,
    pub direction: Option<f64>,
    pub cardinal: String,
    pub unit: &'static str,
}

/// One forecast hour.
#[derive(Debug, Serialize)]
pub struct ForecastView {
    pub time: DateTime<Utc>,
    pub temperature: TemperatureView,
    pub feels_like: Option<f64>,
    pub dew_point: Option<f64>,
    pub humidity: f64,
    pub pressure: Quantity,
    pub wind: WindView,
    pub clouds: f64,
    pub cape: f64,
    pub precipitation: Quantity,
    pub weather: WeatherCondition,
    pub data_quality: DataQualityTier,
}

impl ForecastView {
    pub fn new(f: &NormalizedForecast, units: UnitSystem) -> Self {
        Self {
            time: f.forecast_datetime,
            temperature: TemperatureView::new(&f.temperature, units),
            feels_like: f.feels_like.map(|c| units.temperature_from_celsius(c)),
            dew_point: f.dew_point.map(|c| units.temperature_from_celsius(c)),
            humidity: f.humidity,
            pressure: Quantity {
                value: units.pressure(f.pressure),
                unit: units.pressure_unit(),
            },
            wind: WindView {
                speed: units.speed(f.wind.speed),
                direction: f.wind.direction,
                cardinal: f.wind.cardinal.clone(),
                unit: units.speed_unit(),
            },
            clouds: f.cloud_cover,
            cape: f.cape,
            precipitation: Quantity {
                value: units.precipitation(f.precipitation),
                unit: units.precipitation_unit(),
            },
            weather: f.condition.clone(),
            data_quality: f.data_quality,
        }
    }
}

/// Where the answer is for.
#[derive(Debug, Serialize)]
pub struct LocationView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub cell_id: i64,
    pub cell_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<GeoPoint>,
}

impl From<&Resolution> for LocationView {
    fn from(r: &Resolution) -> Self {
        let point: Option<GeoPoint> = r
            .place
            .as_ref()
            .and_then(|p| p.centroid)
            .or(r.cell.centroid);

        Self {
            name: r.label().to_string(),
            place_id: r.place.as_ref().map(|p| p.id),
            latitude: point.map(|p| p.latitude),
            longitude: point.map(|p| p.longitude),
            timezone: r.place.as_ref().and_then(|p| p.timezone.clone()),
            country: r.place.as_ref().and_then(|p| p.country_code.clone()),
            cell_id: r.cell.id,
            cell_name: r.cell.name.clone(),
            requested: r.requested,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataSourceView {
    pub model: String,
    pub run: String,
    pub run_date: NaiveDate,
    pub cycle: String,
    pub init_time: DateTime<Utc>,
}

impl DataSourceView {
    pub fn new(model: &str, run: &RunId) -> Self {
        Self {
            model: model.to_string(),
            run: run.to_compact(),
            run_date: run.run_date,
            cycle: run.cycle.clone(),
            init_time: run.init_time(),
        }
    }
}

/// `/weather` and hourly `/weather/forecast`.
#[derive(Debug, Serialize)]
pub struct WeatherView {
    pub location: LocationView,
    pub current: ForecastView,
    pub hourly: Vec<ForecastView>,
    pub data_source: DataSourceView,
    pub units: UnitSystem,
}

impl WeatherView {
    pub fn new(point: &PointForecast, units: UnitSystem, model: &str) -> Self {
        Self {
            location: LocationView::from(&point.resolution),
            current: ForecastView::new(point.current(), units),
            hourly: point
                .forecasts
                .iter()
                .map(|f| ForecastView::new(f, units))
                .collect(),
            data_source: DataSourceView::new(model, &point.run),
            units,
        }
    }
}

/// `/weather/current`.
#[derive(Debug, Serialize)]
pub struct CurrentView {
    pub location: LocationView,
    pub current: ForecastView,
    pub data_source: DataSourceView,
    pub units: UnitSystem,
}

impl CurrentView {
    pub fn new(point: &PointForecast, units: UnitSystem, model: &str) -> Self {
        Self {
            location: LocationView::from(&point.resolution),
            current: ForecastView::new(point.current(), units),
            data_source: DataSourceView::new(model, &point.run),
            units,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DayTemperatureView {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DailyView {
    pub date: NaiveDate,
    pub temperature: DayTemperatureView,
    pub humidity: f64,
    /// Accumulated over the day.
    pub precipitation: Quantity,
    pub hours: Vec<ForecastView>,
}

fn precipitation_total_unit(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "mm",
        UnitSystem::Imperial => "in",
    }
}

impl DailyView {
    pub fn new(day: &DailyAggregate, units: UnitSystem) -> Self {
        let convert = |c: Option<f64>| c.map(|c| units.temperature_from_celsius(c));
        Self {
            date: day.date,
            temperature: DayTemperatureView {
                min: convert(day.min_temperature),
                max: convert(day.max_temperature),
                avg: convert(day.avg_temperature),
                unit: units.temperature_unit(),
            },
            humidity: day.avg_humidity,
            precipitation: Quantity {
                value: units.precipitation(day.total_precipitation),
                unit: precipitation_total_unit(units),
            },
            hours: day.hours.iter().map(|f| ForecastView::new(f, units)).collect(),
        }
    }
}

/// `/weather/range` and daily `/weather/forecast`.
#[derive(Debug, Serialize)]
pub struct RangeView {
    pub location: LocationView,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub daily: Vec<DailyView>,
    pub units: UnitSystem,
}

impl RangeView {
    pub fn new(range: &RangeForecast, units: UnitSystem) -> Self {
        Self {
            location: LocationView::from(&range.resolution),
            start: range.start,
            end: range.end,
            count: range.days.len(),
            daily: range.days.iter().map(|d| DailyView::new(d, units)).collect(),
            units,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkResultView {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `/weather/bulk`.
#[derive(Debug, Serialize)]
pub struct BulkView {
    pub count: usize,
    pub results: Vec<BulkResultView>,
}

impl BulkView {
    pub fn new(entries: &[BulkEntry], units: UnitSystem, model: &str) -> Self {
        let results: Vec<BulkResultView> = entries
            .iter()
            .map(|entry| match &entry.outcome {
                Ok(point) => BulkResultView {
                    city: entry.city.clone(),
                    weather: Some(WeatherView::new(point, units, model)),
                    error: None,
                },
                Err(e) => BulkResultView {
                    city: entry.city.clone(),
                    weather: None,
                    error: Some(e.public_message()),
                },
            })
            .collect();

        Self {
            count: results.len(),
            results,
        }
    }
}

/// Name and coordinates of a scanned city.
#[derive(Debug, Serialize)]
pub struct PlaceSummary {
    pub id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&GeoEntity> for PlaceSummary {
    fn from(p: &GeoEntity) -> Self {
        Self {
            id: p.id,
            name: p.display_name().to_string(),
            latitude: p.centroid.map(|c| c.latitude),
            longitude: p.centroid.map(|c| c.longitude),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CityTemperatureView {
    #[serde(flatten)]
    pub place: PlaceSummary,
    pub cell_id: i64,
    pub time: DateTime<Utc>,
    pub temperature: TemperatureView,
    pub weather: WeatherCondition,
}

/// `/weather/cities`.
#[derive(Debug, Serialize)]
pub struct CitiesView {
    pub count: usize,
    pub cities: Vec<CityTemperatureView>,
}

impl CitiesView {
    pub fn new(snapshot: &[CityTemperature], units: UnitSystem) -> Self {
        let cities: Vec<CityTemperatureView> = snapshot
            .iter()
            .map(|c| CityTemperatureView {
                place: PlaceSummary::from(&c.place),
                cell_id: c.cell.id,
                time: c.forecast.forecast_datetime,
                temperature: TemperatureView::new(&c.forecast.temperature, units),
                weather: c.forecast.condition.clone(),
            })
            .collect();

        Self {
            count: cities.len(),
            cities,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrecipitationHourView {
    pub time: DateTime<Utc>,
    /// mm/h.
    pub precipitation: f64,
    pub weather: WeatherCondition,
}

#[derive(Debug, Serialize)]
pub struct PlacePrecipitationView {
    #[serde(flatten)]
    pub place: PlaceSummary,
    pub cell_id: i64,
    pub distance_km: f64,
    /// mm/h.
    pub peak_precipitation: f64,
    pub forecasts: Vec<PrecipitationHourView>,
}

/// `/weather/precipitation`. Rates are always mm/h.
#[derive(Debug, Serialize)]
pub struct PrecipitationView {
    pub threshold: f64,
    pub hours: i64,
    pub count: usize,
    pub places: Vec<PlacePrecipitationView>,
}

impl PrecipitationView {
    pub fn new(threshold: f64, hours: i64, places: &[PlacePrecipitation]) -> Self {
        let places: Vec<PlacePrecipitationView> = places
            .iter()
            .map(|p| PlacePrecipitationView {
                place: PlaceSummary::from(&p.place),
                cell_id: p.cell.id,
                distance_km: p.distance_m / 1000.0,
                peak_precipitation: p.peak,
                forecasts: p
                    .forecasts
                    .iter()
                    .map(|f| PrecipitationHourView {
                        time: f.forecast_datetime,
                        precipitation: f.precipitation,
                        weather: f.condition.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            threshold,
            hours,
            count: places.len(),
            places,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapProperties {
    pub zoom: u8,
    pub bbox: [f64; 4],
}

/// `/weather/map`: a GeoJSON FeatureCollection with no features yet.
#[derive(Debug, Serialize)]
pub struct MapView {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub features: Vec<Value>,
    pub properties: MapProperties,
}

impl MapView {
    pub fn new(bbox: BoundingBox, zoom: u8) -> Self {
        Self {
            type_: "FeatureCollection",
            features: Vec::new(),
            properties: MapProperties {
                zoom,
                bbox: bbox.to_array(),
            },
        }
    }
}

/// `/weather/alerts`.
#[derive(Debug, Serialize)]
pub struct AlertsView {
    pub region: String,
    pub alerts: Vec<Value>,
}
