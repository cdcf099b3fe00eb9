//! Comfort values and condition classification derived from effective values.

use serde::{Deserialize, Serialize};

/// Dew point in °C via the Magnus approximation.
///
/// Only defined for positive relative humidity.
pub fn dew_point(temperature_c: f64, humidity: f64) -> Option<f64> {
    if humidity <= 0.0 {
        return None;
    }
    const A: f64 = 17.27;
    const B: f64 = 237.7;
    let alpha = (A * temperature_c) / (B + temperature_c) + (humidity / 100.0).ln();
    Some((B * alpha) / (A - alpha))
}

/// Apparent temperature in °C.
///
/// Wind chill below 10 °C with wind above 1.3 m/s, the Rothfusz heat index
/// above 27 °C with humidity above 40 %, the air temperature otherwise.
pub fn feels_like(temperature_c: f64, humidity: f64, wind_speed: f64) -> f64 {
    if temperature_c < 10.0 && wind_speed > 1.3 {
        let v = (wind_speed * 3.6).powf(0.16);
        return 13.12 + 0.6215 * temperature_c - 11.37 * v + 0.3965 * temperature_c * v;
    }

    if temperature_c > 27.0 && humidity > 40.0 {
        let t = temperature_c;
        let r = humidity;
        return -8.784_694_755_56 + 1.611_394_11 * t + 2.338_548_838_89 * r
            - 0.146_116_05 * t * r
            - 0.012_308_094 * t * t
            - 0.016_424_827_777_8 * r * r
            + 0.002_211_732 * t * t * r
            + 0.000_725_46 * t * r * r
            - 0.000_003_582 * t * t * r * r;
    }

    temperature_c
}

/// OpenWeather-style condition summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: u16,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl WeatherCondition {
    fn new(id: u16, main: &str, description: &str, icon: &str) -> Self {
        Self {
            id,
            main: main.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }
    }

    /// Classify from temperature (°C), hourly precipitation (mm/h), CAPE and cloud cover.
    pub fn classify(temperature_c: f64, precipitation: f64, cape: f64, cloud_cover: f64) -> Self {
        if precipitation > 0.0 {
            if temperature_c < 0.0 {
                return Self::new(600, "Snow", "snow", "snow");
            }
            if cape > 1000.0 {
                return Self::new(211, "Thunderstorm", "thunderstorm", "thunderstorm");
            }
            if precipitation > 5.0 {
                return Self::new(502, "Rain", "heavy rain", "heavy_rain");
            }
            return Self::new(500, "Rain", "light rain", "rain");
        }

        if cloud_cover > 80.0 {
            Self::new(804, "Clouds", "overcast clouds", "cloudy")
        } else if cloud_cover > 20.0 {
            Self::new(802, "Clouds", "scattered clouds", "partly_cloudy")
        } else {
            Self::new(800, "Clear", "clear sky", "clear")
        }
    }
}
