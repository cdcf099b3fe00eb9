//! Wind derivation from U/V components.

use serde::{Deserialize, Serialize};

const DIRECTIONS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Label used when no direction can be derived.
pub const UNAVAILABLE: &str = "N/A";

/// Derived wind at 10 m.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Speed in m/s; 0 when components are missing.
    pub speed: f64,
    /// Direction the wind blows from, degrees in [0, 360).
    pub direction: Option<f64>,
    pub cardinal: String,
}

impl Wind {
    pub fn from_components(u: f64, v: f64) -> Self {
        let direction = wind_direction(u, v);
        Self {
            speed: wind_speed(u, v),
            direction: Some(direction),
            cardinal: cardinal_direction(direction).to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            speed: 0.0,
            direction: None,
            cardinal: UNAVAILABLE.to_string(),
        }
    }
}

pub fn wind_speed(u: f64, v: f64) -> f64 {
    (u * u + v * v).sqrt()
}

/// Meteorological "from" direction in degrees.
pub fn wind_direction(u: f64, v: f64) -> f64 {
    let degrees = (-u).atan2(-v).to_degrees().rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// 16-point compass label; `"N/A"` for non-numbers.
pub fn cardinal_direction(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return UNAVAILABLE;
    }
    let index = ((degrees.rem_euclid(360.0) + 11.25) / 22.5) as usize % 16;
    DIRECTIONS[index]
}
