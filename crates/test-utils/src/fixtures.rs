//! Seeded Greek fixtures.
//!
//! Tiles are generated relative to a caller-supplied `now` so tests that go
//! through `Utc::now()` and tests with a pinned clock both see fresh data.
//!
//! | Place | Cell | Data |
//! |-------|------|------|
//! | Athens | 1 (precomputed) | 293.15 K, northerly 4 m/s, dry; an older run at 280.15 K |
//! | Thessaloniki | 2 (containment) | 288.15 K via `tmp_level_2_m`, 0.36 mm/h |
//! | City X | 3 (containment) | 290.15 K via `2t_level_2`, up to 2.16 mm/h |
//! | Patras | 4 (precomputed) | no tiles |
//! | Megisti | none within 50 km | - |

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde_json::{json, Map, Value};

use kairos_common::{BoundingBox, Cell, GeoEntity, GeoPoint, NewForecastTile, RunId};

use crate::memory::InMemoryStore;

/// Well-known ids in the seeded data.
pub mod ids {
    pub const GREECE: i64 = 1;
    pub const ATTICA: i64 = 10;
    pub const DISABLED_ATHENS: i64 = 90;
    pub const ATHENS: i64 = 100;
    pub const THESSALONIKI: i64 = 101;
    pub const CITY_X: i64 = 102;
    pub const PATRAS: i64 = 103;
    pub const MEGISTI: i64 = 104;

    pub const CELL_ATHENS: i64 = 1;
    pub const CELL_THESSALONIKI: i64 = 2;
    pub const CELL_CITY_X: i64 = 3;
    pub const CELL_PATRAS: i64 = 4;
    pub const CELL_ATHENS_EAST: i64 = 5;
    pub const CELL_DISABLED: i64 = 6;
}

/// Hours of hourly tiles generated per cell.
pub const SEEDED_HOURS: i64 = 72;

pub const ATHENS_CENTROID: GeoPoint = GeoPoint {
    latitude: 37.9838,
    longitude: 23.7275,
};

pub const THESSALONIKI_CENTROID: GeoPoint = GeoPoint {
    latitude: 40.6401,
    longitude: 22.9444,
};

/// Start of the hour containing `now`.
pub fn hour_floor(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::hours(1)).unwrap_or(now)
}

/// Build a payload object from key/value pairs.
pub fn payload(pairs: &[(&str, f64)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}

pub fn cell(id: i64, name: &str, bounds: BoundingBox) -> Cell {
    Cell {
        id,
        name: name.to_string(),
        is_enabled: true,
        centroid: Some(GeoPoint::new(
            (bounds.south + bounds.north) / 2.0,
            (bounds.west + bounds.east) / 2.0,
        )),
    }
}

/// A minimal enabled city.
pub fn city(id: i64, name: &str, name_en: Option<&str>, centroid: GeoPoint) -> GeoEntity {
    GeoEntity {
        id,
        name: name.to_string(),
        name_en: name_en.map(str::to_string),
        name_local: None,
        alt_names: Vec::new(),
        entity_type: "city".to_string(),
        admin_level: 8,
        parent_id: Some(ids::GREECE),
        country_code: Some("GR".to_string()),
        centroid: Some(centroid),
        timezone: Some("Europe/Athens".to_string()),
        population: None,
        is_enabled: true,
        cell_id: None,
    }
}

fn area(id: i64, name: &str, name_en: &str, entity_type: &str, admin_level: i32) -> GeoEntity {
    GeoEntity {
        id,
        name: name.to_string(),
        name_en: Some(name_en.to_string()),
        name_local: None,
        alt_names: Vec::new(),
        entity_type: entity_type.to_string(),
        admin_level,
        parent_id: None,
        country_code: Some("GR".to_string()),
        centroid: None,
        timezone: Some("Europe/Athens".to_string()),
        population: None,
        is_enabled: true,
        cell_id: None,
    }
}

fn hourly_tiles<F>(
    cell_id: i64,
    run: &RunId,
    start: DateTime<Utc>,
    hours: i64,
    mut data: F,
) -> Vec<NewForecastTile>
where
    F: FnMut(i64) -> Map<String, Value>,
{
    (0..hours)
        .map(|h| NewForecastTile {
            cell_id,
            run: run.clone(),
            forecast_datetime: start + Duration::hours(h),
            forecast_data: data(h),
        })
        .collect()
}

/// The seeded Greek dataset described in the module docs.
pub fn greece(now: DateTime<Utc>) -> InMemoryStore {
    let start = hour_floor(now);
    let run = RunId::latest_available(now);
    let older_run = RunId::latest_available(now - Duration::hours(6));

    let greece = GeoEntity {
        population: Some(10_400_000),
        ..area(ids::GREECE, "Ελλάδα", "Greece", "country", 2)
    };
    let attica = GeoEntity {
        parent_id: Some(ids::GREECE),
        population: Some(3_800_000),
        ..area(ids::ATTICA, "Αττική", "Attica", "region", 4)
    };
    let athens = GeoEntity {
        name_local: Some("Athina".to_string()),
        alt_names: vec!["Athènes".to_string(), "Atene".to_string()],
        parent_id: Some(ids::ATTICA),
        population: Some(664_046),
        cell_id: Some(ids::CELL_ATHENS),
        ..city(ids::ATHENS, "Αθήνα", Some("Athens"), ATHENS_CENTROID)
    };
    // Same English name, bigger and disabled: exact-name lookup must skip it.
    let stale_athens = GeoEntity {
        population: Some(3_000_000),
        is_enabled: false,
        ..city(ids::DISABLED_ATHENS, "Athens", None, ATHENS_CENTROID)
    };
    let thessaloniki = GeoEntity {
        population: Some(325_182),
        ..city(
            ids::THESSALONIKI,
            "Θεσσαλονίκη",
            Some("Thessaloniki"),
            THESSALONIKI_CENTROID,
        )
    };
    let city_x = GeoEntity {
        population: Some(20_000),
        ..city(ids::CITY_X, "City X", None, GeoPoint::new(39.25, 21.75))
    };
    let patras = GeoEntity {
        population: Some(167_446),
        cell_id: Some(ids::CELL_PATRAS),
        ..city(ids::PATRAS, "Πάτρα", Some("Patras"), GeoPoint::new(38.2466, 21.7346))
    };
    let megisti = GeoEntity {
        population: Some(492),
        ..city(ids::MEGISTI, "Μεγίστη", Some("Megisti"), GeoPoint::new(36.15, 29.59))
    };

    let athens_cell = BoundingBox::new(37.85, 23.55, 38.15, 23.95);
    let thessaloniki_cell = BoundingBox::new(40.45, 22.75, 40.85, 23.15);
    let city_x_cell = BoundingBox::new(39.1, 21.6, 39.4, 21.9);
    let patras_cell = BoundingBox::new(38.1, 21.6, 38.4, 21.9);
    // Overlaps the Athens cell between 23.90 and 23.95 east.
    let athens_east_cell = BoundingBox::new(37.85, 23.9, 38.15, 24.2);
    let disabled_cell = BoundingBox::new(35.0, 25.0, 35.3, 25.3);

    let mut store = InMemoryStore::new()
        .with_cell(cell(ids::CELL_ATHENS, "GR_ATH", athens_cell), athens_cell)
        .with_cell(
            cell(ids::CELL_THESSALONIKI, "GR_SKG", thessaloniki_cell),
            thessaloniki_cell,
        )
        .with_cell(cell(ids::CELL_CITY_X, "GR_CTX", city_x_cell), city_x_cell)
        .with_cell(cell(ids::CELL_PATRAS, "GR_PAT", patras_cell), patras_cell)
        .with_cell(
            cell(ids::CELL_ATHENS_EAST, "GR_ATH_E", athens_east_cell),
            athens_east_cell,
        )
        .with_cell(
            Cell {
                is_enabled: false,
                ..cell(ids::CELL_DISABLED, "GR_OFF", disabled_cell)
            },
            disabled_cell,
        )
        .with_place(greece, Some(BoundingBox::new(34.0, 19.0, 42.0, 30.0)))
        .with_place(attica, Some(BoundingBox::new(37.6, 23.2, 38.4, 24.2)))
        .with_place(athens, Some(BoundingBox::new(37.93, 23.65, 38.05, 23.80)))
        .with_place(stale_athens, None)
        .with_place(
            thessaloniki,
            Some(BoundingBox::new(40.58, 22.88, 40.70, 23.00)),
        )
        .with_place(city_x, Some(BoundingBox::new(39.2, 21.7, 39.3, 21.8)))
        .with_place(patras, Some(BoundingBox::new(38.2, 21.7, 38.3, 21.8)))
        .with_place(megisti, None);

    let created = now - Duration::hours(1);
    let athens_old = hourly_tiles(ids::CELL_ATHENS, &older_run, start, SEEDED_HOURS, |_| {
        payload(&[("t_2m", 280.15), ("u_10m", 1.0), ("v_10m", 1.0)])
    });
    let athens_new = hourly_tiles(ids::CELL_ATHENS, &run, start, SEEDED_HOURS, |_| {
        payload(&[
            ("t_2m", 293.15),
            ("relhum_2m", 60.0),
            ("u_10m", 0.0),
            ("v_10m", -4.0),
            ("pmsl", 101_300.0),
            ("clct", 10.0),
            ("prate_level_surface", 0.0),
        ])
    });
    let thessaloniki_tiles =
        hourly_tiles(ids::CELL_THESSALONIKI, &run, start, SEEDED_HOURS, |_| {
            payload(&[
                ("tmp_level_2_m", 288.15),
                ("rh_level_2_m", 70.0),
                ("ugrd_level_10_m", 3.0),
                ("vgrd_level_10_m", 0.0),
                ("prate_level_0", 0.0001),
                ("tcdc_level_entire", 90.0),
            ])
        });
    let city_x_tiles = hourly_tiles(ids::CELL_CITY_X, &run, start, SEEDED_HOURS, |h| {
        payload(&[
            ("2t_level_2", 290.15),
            ("2r_level_2", 85.0),
            ("10u_level_10", -2.0),
            ("10v_level_10", -2.0),
            ("prate_level_surface", 0.0002 * (h % 4) as f64),
            ("clct", 100.0),
        ])
    });

    for tile in athens_old
        .into_iter()
        .chain(athens_new)
        .chain(thessaloniki_tiles)
        .chain(city_x_tiles)
    {
        store = store.with_tile(tile, created);
    }
    store
}
