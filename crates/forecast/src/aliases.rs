//! Ordered alias table for raw payload keys.
//!
//! Different model-version exports store the same quantity under different
//! keys (`t_2m`, `tmp_level_2_m`, `2t_level_2`, ...). Each canonical field
//! lists its aliases in lookup order together with the unit that alias is
//! stored in, so unit conversion follows the key that actually matched.

/// Physical quantity a payload key can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Temperature,
    Humidity,
    WindU,
    WindV,
    CloudCover,
    Precipitation,
    Pressure,
    Cape,
}

/// Unit of the raw stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUnit {
    /// Kelvin or Celsius; resolved by the range heuristic in `units`.
    TemperatureAmbiguous,
    Percent,
    MetersPerSecond,
    /// Precipitation rate, kg m-2 s-1 (equivalent to mm/s).
    MillimetersPerSecond,
    /// Precipitation accumulated over one hourly step.
    MillimetersPerHour,
    Pascal,
    JoulesPerKilogram,
}

/// One entry of the alias table.
#[derive(Debug, Clone, Copy)]
pub struct Alias {
    pub key: &'static str,
    pub unit: RawUnit,
}

const fn alias(key: &'static str, unit: RawUnit) -> Alias {
    Alias { key, unit }
}

const TEMPERATURE: &[Alias] = &[
    alias("t_2m", RawUnit::TemperatureAmbiguous),
    alias("tmp_level_2_m", RawUnit::TemperatureAmbiguous),
    alias("2t_level_2", RawUnit::TemperatureAmbiguous),
];

const HUMIDITY: &[Alias] = &[
    alias("relhum_2m", RawUnit::Percent),
    alias("rh_level_2_m", RawUnit::Percent),
    alias("2r_level_2", RawUnit::Percent),
];

const WIND_U: &[Alias] = &[
    alias("u_10m", RawUnit::MetersPerSecond),
    alias("ugrd_level_10_m", RawUnit::MetersPerSecond),
    alias("10u_level_10", RawUnit::MetersPerSecond),
];

const WIND_V: &[Alias] = &[
    alias("v_10m", RawUnit::MetersPerSecond),
    alias("vgrd_level_10_m", RawUnit::MetersPerSecond),
    alias("10v_level_10", RawUnit::MetersPerSecond),
];

const CLOUD_COVER: &[Alias] = &[
    alias("clct", RawUnit::Percent),
    alias("tcdc_level_entire", RawUnit::Percent),
    alias("tcdc_level_0", RawUnit::Percent),
];

// Rate keys win over the hourly accumulation.
const PRECIPITATION: &[Alias] = &[
    alias("prate_level_surface", RawUnit::MillimetersPerSecond),
    alias("prate_level_0", RawUnit::MillimetersPerSecond),
    alias("tot_prec", RawUnit::MillimetersPerHour),
];

const PRESSURE: &[Alias] = &[
    alias("pmsl", RawUnit::Pascal),
    alias("pres_level_surface", RawUnit::Pascal),
    alias("prmsl_level_0", RawUnit::Pascal),
];

const CAPE: &[Alias] = &[
    alias("cape_level_surface", RawUnit::JoulesPerKilogram),
    alias("cape_level_0", RawUnit::JoulesPerKilogram),
];

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Temperature,
        CanonicalField::Humidity,
        CanonicalField::WindU,
        CanonicalField::WindV,
        CanonicalField::CloudCover,
        CanonicalField::Precipitation,
        CanonicalField::Pressure,
        CanonicalField::Cape,
    ];

    /// Aliases in the order they are tried.
    pub fn aliases(&self) -> &'static [Alias] {
        match self {
            CanonicalField::Temperature => TEMPERATURE,
            CanonicalField::Humidity => HUMIDITY,
            CanonicalField::WindU => WIND_U,
            CanonicalField::WindV => WIND_V,
            CanonicalField::CloudCover => CLOUD_COVER,
            CanonicalField::Precipitation => PRECIPITATION,
            CanonicalField::Pressure => PRESSURE,
            CanonicalField::Cape => CAPE,
        }
    }

    /// Map an upstream key to its canonical field, if known.
    pub fn for_key(key: &str) -> Option<CanonicalField> {
        Self::ALL
            .into_iter()
            .find(|field| field.aliases().iter().any(|a| a.key == key))
    }
}
