//! Temperature unit inference and unit-system conversions.

use serde::{Deserialize, Serialize};

use kairos_common::{KairosError, KairosResult};

/// Raw values in this range are read as Kelvin.
pub const KELVIN_RANGE: (f64, f64) = (200.0, 333.0);

/// Raw values in this range are read as Celsius.
///
/// The two windows leave gaps: a genuine -75 °C reading lands in neither
/// and is discarded. Kept as-is until upstream tags units explicitly.
pub const CELSIUS_RANGE: (f64, f64) = (-80.0, 60.0);

const KELVIN_OFFSET: f64 = 273.15;

/// A temperature in all three scales. All zero when no valid reading exists.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Temperature {
    pub kelvin: f64,
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            kelvin: celsius + KELVIN_OFFSET,
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        }
    }

    pub fn from_kelvin(kelvin: f64) -> Self {
        Self::from_celsius(kelvin - KELVIN_OFFSET)
    }

    /// Infer the unit of a raw value from its range.
    ///
    /// Returns `None` when the value fits neither window.
    pub fn infer(raw: f64) -> Option<Self> {
        if raw >= KELVIN_RANGE.0 && raw <= KELVIN_RANGE.1 {
            Some(Self::from_kelvin(raw))
        } else if raw >= CELSIUS_RANGE.0 && raw <= CELSIUS_RANGE.1 {
            Some(Self::from_celsius(raw))
        } else {
            None
        }
    }

    /// True when this holds a real reading rather than the zero sentinel.
    pub fn is_valid(&self) -> bool {
        self.kelvin > 0.0
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Measurement system requested by API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Parse the `units` query parameter. Missing or empty means metric.
    pub fn parse(value: Option<&str>) -> KairosResult<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(UnitSystem::Metric),
            Some(v) if v.is_empty() || v == "metric" => Ok(UnitSystem::Metric),
            Some(v) if v == "imperial" => Ok(UnitSystem::Imperial),
            Some(v) => Err(KairosError::invalid(
                "units",
                format!("expected 'metric' or 'imperial', got '{}'", v),
            )),
        }
    }

    pub fn temperature(&self, t: &Temperature) -> f64 {
        match self {
            UnitSystem::Metric => t.celsius,
            UnitSystem::Imperial => t.fahrenheit,
        }
    }

    /// Convert a Celsius quantity (dew point, feels-like).
    pub fn temperature_from_celsius(&self, celsius: f64) -> f64 {
        match self {
            UnitSystem::Metric => celsius,
            UnitSystem::Imperial => celsius_to_fahrenheit(celsius),
        }
    }

    pub fn speed(&self, meters_per_second: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters_per_second,
            UnitSystem::Imperial => meters_per_second * 2.236_936,
        }
    }

    pub fn precipitation(&self, millimeters: f64) -> f64 {
        match self {
            UnitSystem::Metric => millimeters,
            UnitSystem::Imperial => millimeters / 25.4,
        }
    }

    pub fn pressure(&self, hectopascal: f64) -> f64 {
        match self {
            UnitSystem::Metric => hectopascal,
            UnitSystem::Imperial => hectopascal * 0.029_529_983,
        }
    }

    pub fn temperature_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "C",
            UnitSystem::Imperial => "F",
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn precipitation_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mm/h",
            UnitSystem::Imperial => "in/h",
        }
    }

    pub fn pressure_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "hPa",
            UnitSystem::Imperial => "inHg",
        }
    }
}
