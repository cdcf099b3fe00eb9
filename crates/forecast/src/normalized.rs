//! The canonical per-instant forecast built from a raw tile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use kairos_common::ForecastTile;

use crate::derived::{dew_point, feels_like, WeatherCondition};
use crate::payload::RawPayload;
use crate::quality::DataQualityTier;
use crate::units::Temperature;
use crate::wind::Wind;

/// Effective values for one forecast instant. Built on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub forecast_datetime: DateTime<Utc>,
    pub temperature: Temperature,
    /// Relative humidity, %.
    pub humidity: f64,
    pub wind: Wind,
    /// Hourly rate, mm/h.
    pub precipitation: f64,
    /// hPa.
    pub pressure: f64,
    /// %.
    pub cloud_cover: f64,
    /// J/kg.
    pub cape: f64,
    /// °C.
    pub dew_point: Option<f64>,
    /// °C; absent without a valid temperature.
    pub feels_like: Option<f64>,
    pub condition: WeatherCondition,
    pub data_quality: DataQualityTier,
}

impl NormalizedForecast {
    pub fn from_tile(tile: &ForecastTile) -> Self {
        Self::from_payload(tile.forecast_datetime, &tile.forecast_data)
    }

    pub fn from_payload(forecast_datetime: DateTime<Utc>, data: &Map<String, Value>) -> Self {
        let raw = RawPayload::new(data);

        let temperature = raw.effective_temperature();
        let humidity = raw.effective_humidity();
        let wind = match raw.wind_components() {
            Some((u, v)) => Wind::from_components(u, v),
            None => Wind::unavailable(),
        };
        let precipitation = raw.effective_precipitation();
        let cloud_cover = raw.effective_cloud_cover();
        let cape = raw.effective_cape();

        let (dew_point, feels_like) = if temperature.is_valid() {
            (
                dew_point(temperature.celsius, humidity),
                Some(feels_like(temperature.celsius, humidity, wind.speed)),
            )
        } else {
            (None, None)
        };

        Self {
            forecast_datetime,
            condition: WeatherCondition::classify(
                temperature.celsius,
                precipitation,
                cape,
                cloud_cover,
            ),
            data_quality: DataQualityTier::from_flags(
                raw.has_temperature_data(),
                raw.has_wind_data(),
            ),
            temperature,
            humidity,
            wind,
            precipitation,
            pressure: raw.effective_pressure(),
            cloud_cover,
            cape,
            dew_point,
            feels_like,
        }
    }

    pub fn has_valid_temperature(&self) -> bool {
        self.temperature.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_complete_payload() {
        let data = object(json!({
            "t_2m": 293.15,
            "relhum_2m": 55.0,
            "u_10m": 0.0,
            "v_10m": -4.0,
            "pmsl": 101200.0,
            "clct": 10.0,
        }));
        let nf = NormalizedForecast::from_payload(at_noon(), &data);
        assert!((nf.temperature.celsius - 20.0).abs() < 0.01);
        assert_eq!(nf.wind.cardinal, "N");
        assert!((nf.pressure - 1012.0).abs() < 1e-9);
        assert_eq!(nf.data_quality, DataQualityTier::Complete);
        assert_eq!(nf.condition.id, 800);
        assert!(nf.dew_point.is_some());
    }

    #[test]
    fn test_empty_payload_is_minimal() {
        let nf = NormalizedForecast::from_payload(at_noon(), &Map::new());
        assert_eq!(nf.data_quality, DataQualityTier::Minimal);
        assert_eq!(nf.wind.speed, 0.0);
        assert_eq!(nf.wind.cardinal, "N/A");
        assert!(nf.feels_like.is_none());
        assert!(!nf.has_valid_temperature());
    }

    #[test]
    fn test_wind_without_temperature_is_partial() {
        let data = object(json!({"ugrd_level_10_m": 1.0, "vgrd_level_10_m": 1.0}));
        let nf = NormalizedForecast::from_payload(at_noon(), &data);
        assert_eq!(nf.data_quality, DataQualityTier::Partial);
    }

    #[test]
    fn test_direction_serializes_null_when_absent() {
        let nf = NormalizedForecast::from_payload(at_noon(), &object(json!({"t_2m": 15.0})));
        let json = serde_json::to_value(&nf).unwrap();
        assert!(json["wind"]["direction"].is_null());
        assert_eq!(json["data_quality"], "partial");
    }
}
