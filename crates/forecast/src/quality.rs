use serde::{Deserialize, Serialize};

/// How much of the core data a tile actually carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQualityTier {
    /// Temperature and both wind components.
    Complete,
    /// Exactly one of temperature or wind.
    Partial,
    Minimal,
}

impl DataQualityTier {
    pub fn from_flags(has_temperature: bool, has_wind: bool) -> Self {
        match (has_temperature, has_wind) {
            (true, true) => DataQualityTier::Complete,
            (false, false) => DataQualityTier::Minimal,
            _ => DataQualityTier::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataQualityTier::Complete => "complete",
            DataQualityTier::Partial => "partial",
            DataQualityTier::Minimal => "minimal",
        }
    }
}
