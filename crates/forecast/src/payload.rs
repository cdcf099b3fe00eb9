//! Effective-value lookup over a raw tile payload.

use serde_json::{Map, Value};

use crate::aliases::{CanonicalField, RawUnit};
use crate::units::Temperature;

/// A value read from the payload, tagged with whether any alias was present.
///
/// `value` is 0 when absent so callers that only want a number can ignore
/// the flag; callers that must tell "0" from "no data" check `present`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub present: bool,
    pub unit: Option<RawUnit>,
}

impl Reading {
    pub const ABSENT: Reading = Reading {
        value: 0.0,
        present: false,
        unit: None,
    };

    fn present(value: f64, unit: RawUnit) -> Self {
        Self {
            value,
            present: true,
            unit: Some(unit),
        }
    }

    pub fn as_option(&self) -> Option<f64> {
        self.present.then_some(self.value)
    }
}

/// Borrowed view over the JSON object stored in a tile.
#[derive(Debug, Clone, Copy)]
pub struct RawPayload<'a> {
    data: &'a Map<String, Value>,
}

/// Numbers are taken as-is; numeric strings are parsed; everything else is absent.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

impl<'a> RawPayload<'a> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Self { data }
    }

    /// First present alias of `field`, in lookup order.
    pub fn reading(&self, field: CanonicalField) -> Reading {
        field
            .aliases()
            .iter()
            .find_map(|alias| {
                self.data
                    .get(alias.key)
                    .and_then(numeric)
                    .map(|v| Reading::present(v, alias.unit))
            })
            .unwrap_or(Reading::ABSENT)
    }

    pub fn has_temperature_data(&self) -> bool {
        self.reading(CanonicalField::Temperature).present
    }

    pub fn has_wind_data(&self) -> bool {
        self.reading(CanonicalField::WindU).present && self.reading(CanonicalField::WindV).present
    }

    /// Temperature in all scales, or all zeros when missing or out of range.
    pub fn effective_temperature(&self) -> Temperature {
        self.reading(CanonicalField::Temperature)
            .as_option()
            .and_then(Temperature::infer)
            .unwrap_or_default()
    }

    pub fn effective_humidity(&self) -> f64 {
        self.reading(CanonicalField::Humidity).value
    }

    pub fn effective_cloud_cover(&self) -> f64 {
        self.reading(CanonicalField::CloudCover).value
    }

    pub fn effective_cape(&self) -> f64 {
        self.reading(CanonicalField::Cape).value
    }

    /// U and V together; `None` unless both are present.
    pub fn wind_components(&self) -> Option<(f64, f64)> {
        let u = self.reading(CanonicalField::WindU).as_option()?;
        let v = self.reading(CanonicalField::WindV).as_option()?;
        Some((u, v))
    }

    /// Precipitation as an hourly rate in mm/h.
    pub fn effective_precipitation(&self) -> f64 {
        let reading = self.reading(CanonicalField::Precipitation);
        match reading.unit {
            Some(RawUnit::MillimetersPerSecond) => reading.value * 3600.0,
            _ => reading.value,
        }
    }

    /// Pressure in hPa; 0 when missing or non-positive.
    pub fn effective_pressure(&self) -> f64 {
        let reading = self.reading(CanonicalField::Pressure);
        if reading.present && reading.value > 0.0 {
            reading.value / 100.0
        } else {
            0.0
        }
    }
}
