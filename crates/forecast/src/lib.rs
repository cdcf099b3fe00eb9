//! Forecast normalization for Kairos.
//!
//! Raw tiles carry whatever variable names the upstream export used. This
//! crate hides that drift behind an ordered alias table and produces
//! canonical physical quantities:
//! - Temperature in K/°C/°F (with a range heuristic for the source unit)
//! - Wind speed, meteorological direction and 16-point cardinal label
//! - Hourly precipitation rate, pressure in hPa, humidity, cloud cover
//! - A data-quality tier derived from the fields actually present

pub mod aliases;
pub mod derived;
pub mod normalized;
pub mod payload;
pub mod quality;
pub mod units;
pub mod wind;

pub use aliases::{CanonicalField, RawUnit};
pub use derived::WeatherCondition;
pub use normalized::NormalizedForecast;
pub use payload::{RawPayload, Reading};
pub use quality::DataQualityTier;
pub use units::{Temperature, UnitSystem};
pub use wind::{cardinal_direction, Wind};
