//! Property-style tests for tile normalization across alias variants.

use chrono::{TimeZone, Utc};
use forecast::{cardinal_direction, DataQualityTier, NormalizedForecast};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object fixture")
}

fn normalize(value: Value) -> NormalizedForecast {
    let at = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    NormalizedForecast::from_payload(at, &object(value))
}

// ============================================================================
// Wind
// ============================================================================

#[test]
fn test_wind_speed_is_hypot_for_every_alias_family() {
    let families = [
        ("u_10m", "v_10m"),
        ("ugrd_level_10_m", "vgrd_level_10_m"),
        ("10u_level_10", "10v_level_10"),
    ];
    let components = [(3.0, 4.0), (-7.5, 2.25), (0.0, 0.0), (-0.1, -12.0)];

    for (uk, vk) in families {
        for (u, v) in components {
            let mut data = Map::new();
            data.insert(uk.to_string(), json!(u));
            data.insert(vk.to_string(), json!(v));
            let at = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
            let nf = NormalizedForecast::from_payload(at, &data);
            let expected: f64 = u * u + v * v;
            assert_eq!(nf.wind.speed, expected.sqrt(), "{} {}", uk, vk);
            let dir = nf.wind.direction.expect("direction present");
            assert!((0.0..360.0).contains(&dir), "direction {} out of range", dir);
        }
    }
}

#[test]
fn test_missing_both_components() {
    let nf = normalize(json!({"t_2m": 290.0}));
    assert_eq!(nf.wind.speed, 0.0);
    assert_eq!(nf.wind.cardinal, "N/A");
    assert!(nf.wind.direction.is_none());
}

#[test]
fn test_cardinal_is_total() {
    let mut degrees = 0.0;
    while degrees < 360.0 {
        let label = cardinal_direction(degrees);
        assert_ne!(label, "N/A", "{} produced N/A", degrees);
        degrees += 0.5;
    }
    for d in [-11.25f64, -0.1, 0.0, 11.2499] {
        assert_eq!(cardinal_direction(d.rem_euclid(360.0)), "N");
    }
}

// ============================================================================
// Quality tier
// ============================================================================

#[test]
fn test_quality_tier_follows_present_fields() {
    let complete = normalize(json!({"tmp_level_2_m": 280.0, "u_10m": 1.0, "vgrd_level_10_m": 1.0}));
    assert_eq!(complete.data_quality, DataQualityTier::Complete);

    // temperature out of range is still temperature-bearing
    let odd_temp = normalize(json!({"t_2m": 150.0}));
    assert_eq!(odd_temp.data_quality, DataQualityTier::Partial);
    assert_eq!(odd_temp.temperature.kelvin, 0.0);

    let half_wind = normalize(json!({"u_10m": 1.0}));
    assert_eq!(half_wind.data_quality, DataQualityTier::Minimal);
}

// ============================================================================
// Units
// ============================================================================

#[test]
fn test_precipitation_rate_times_3600() {
    for raw in [0.0, 0.000_138_9, 0.001, 0.0125] {
        let nf = normalize(json!({"prate_level_0": raw}));
        assert!((nf.precipitation - raw * 3600.0).abs() < 1e-9);
    }
}

#[test]
fn test_kelvin_tile_yields_twenty_celsius() {
    let nf = normalize(json!({"2t_level_2": 293.15}));
    assert!((nf.temperature.celsius - 20.0).abs() < 0.01);
}
