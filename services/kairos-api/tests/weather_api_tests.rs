//! Router-level tests for the weather endpoints over the seeded Greek
//! fixtures.

mod common;

use axum::http::StatusCode;

use common::{app_with, get, get_json, greece_app};
use kairos_common::{BoundingBox, GeoEntity, GeoPoint};
use test_utils::fixtures::{self, ids};
use test_utils::DRIVER_ERROR_TEXT;

// ============================================================================
// Point queries
// ============================================================================

#[tokio::test]
async fn test_weather_by_coordinates_converts_kelvin() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather?lat=37.9838&lon=23.7275").await;

    assert_eq!(status, StatusCode::OK);
    let celsius = json["current"]["temperature"]["celsius"].as_f64().unwrap();
    assert!((celsius - 20.0).abs() < 0.01, "got {}", celsius);
    assert_eq!(json["location"]["name"], "Athens");
    assert_eq!(json["location"]["cell_id"], ids::CELL_ATHENS);
    assert_eq!(json["data_source"]["model"], "ICON-EU");
    assert_eq!(json["hourly"].as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_weather_location_echoes_requested_point() {
    let (app, _) = greece_app();

    let (_, json) = get_json(&app, "/weather?lat=37.9&lon=23.92").await;
    let location = &json["location"];
    assert_eq!(location["requested"]["latitude"], 37.9);
    assert_eq!(location["requested"]["longitude"], 23.92);
    // The centroid of the matched place, not the asked-for point.
    assert_ne!(location["latitude"], 37.9);

    let (_, json) = get_json(&app, "/weather/current?city=Athens").await;
    assert!(json["location"].get("requested").is_none());
}

#[tokio::test]
async fn test_weather_lng_alias_and_containment() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather?lat=40.6401&lng=22.9444&hours=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["name"], "Thessaloniki");
    assert_eq!(json["location"]["cell_id"], ids::CELL_THESSALONIKI);
    assert_eq!(json["hourly"].as_array().unwrap().len(), 3);
    let celsius = json["current"]["temperature"]["celsius"].as_f64().unwrap();
    assert!((celsius - 15.0).abs() < 0.01);
    // 0.0001 mm/s stored, reported hourly.
    let precip = json["current"]["precipitation"]["value"].as_f64().unwrap();
    assert!((precip - 0.36).abs() < 1e-9);
}

#[tokio::test]
async fn test_weather_by_name_variant_skips_disabled_duplicate() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather?city=athens").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["place_id"], ids::ATHENS);
    // Newest run wins: 293.15 K rather than the older 280.15 K.
    let celsius = json["current"]["temperature"]["celsius"].as_f64().unwrap();
    assert!((celsius - 20.0).abs() < 0.01);
    assert_eq!(json["current"]["wind"]["cardinal"], "N");
    assert_eq!(json["current"]["data_quality"], "complete");
}

#[tokio::test]
async fn test_weather_imperial_units() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather?city=Athens&units=imperial").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["units"], "imperial");
    let value = json["current"]["temperature"]["value"].as_f64().unwrap();
    assert!((value - 68.0).abs() < 0.01);
    assert_eq!(json["current"]["wind"]["unit"], "mph");
}

#[tokio::test]
async fn test_weather_hours_clamped() {
    let (app, _) = greece_app();

    let (_, json) = get_json(&app, "/weather?city=Athens&hours=500").await;
    assert_eq!(
        json["hourly"].as_array().unwrap().len(),
        fixtures::SEEDED_HOURS as usize
    );

    let (_, json) = get_json(&app, "/weather?city=Athens&hours=-2").await;
    assert_eq!(json["hourly"].as_array().unwrap().len(), 24);

    let (_, json) = get_json(&app, "/weather?city=Athens&hours=lots").await;
    assert_eq!(json["hourly"].as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_weather_errors() {
    let (app, _) = greece_app();

    let (status, json) = get_json(&app, "/weather?city=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["type"], "not-found");

    // Known place, cell without tiles.
    let (status, _) = get_json(&app, "/weather?city=Patras").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Known place, outside every cell.
    let (status, _) = get_json(&app, "/weather?city=Megisti").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get_json(&app, "/weather?city=Athens&units=kelvin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("units"));

    let (status, _) = get_json(&app, "/weather?lat=95&lon=23").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather?lat=37.9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlapping_cells_use_lowest_id() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather?lat=37.9&lon=23.92").await;

    assert_eq!(status, StatusCode::OK);
    // Outside the Athens city bounds, inside the Attica region.
    assert_eq!(json["location"]["name"], "Attica");
    assert_eq!(json["location"]["cell_id"], ids::CELL_ATHENS);
}

#[tokio::test]
async fn test_region_cell_association_ignored_for_coordinates() {
    let east_attica = GeoEntity {
        entity_type: "region".to_string(),
        admin_level: 6,
        cell_id: Some(ids::CELL_ATHENS_EAST),
        ..fixtures::city(300, "East Attica", None, GeoPoint::new(37.95, 23.95))
    };
    let (app, _) = app_with(
        fixtures::greece(chrono::Utc::now())
            .with_place(east_attica, Some(BoundingBox::new(37.8, 23.85, 38.1, 24.1))),
    );

    let (status, json) = get_json(&app, "/weather?lat=37.9&lon=23.92").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["name"], "East Attica");
    // Containment picks the lowest enabled id, not the region's stored cell.
    assert_eq!(json["location"]["cell_id"], ids::CELL_ATHENS);
}

#[tokio::test]
async fn test_disabled_precomputed_cell_falls_back_to_containment() {
    let kifisia = GeoEntity {
        cell_id: Some(ids::CELL_DISABLED),
        ..fixtures::city(200, "Kifisia", None, GeoPoint::new(38.07, 23.81))
    };
    let (app, _) = app_with(fixtures::greece(chrono::Utc::now()).with_place(kifisia, None));

    let (status, json) = get_json(&app, "/weather?city=Kifisia").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["cell_id"], ids::CELL_ATHENS);
}

#[tokio::test]
async fn test_current_endpoint_shape() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather/current?city=Thessaloniki").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.get("location").is_some());
    assert!(json.get("current").is_some());
    assert!(json.get("data_source").is_some());
    assert!(json.get("hourly").is_none());
}

// ============================================================================
// Forecast and range
// ============================================================================

#[tokio::test]
async fn test_forecast_daily_and_hourly() {
    let (app, _) = greece_app();

    let (status, json) = get_json(&app, "/weather/forecast?city=Athens&type=daily&days=2").await;
    assert_eq!(status, StatusCode::OK);
    let days = json["daily"].as_array().unwrap();
    assert!(!days.is_empty() && days.len() <= 3);
    let avg = days[0]["temperature"]["avg"].as_f64().unwrap();
    assert!((avg - 20.0).abs() < 0.01);

    let (status, json) = get_json(&app, "/weather/forecast?city=Athens&hours=6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hourly"].as_array().unwrap().len(), 6);

    let (status, _) = get_json(&app, "/weather/forecast?city=Athens&type=weekly").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_daily_includes_current_hour() {
    let (app, _) = greece_app();
    let requested_at = chrono::Utc::now();

    let (status, json) = get_json(&app, "/weather/forecast?city=Athens&type=daily&days=1").await;
    assert_eq!(status, StatusCode::OK);
    let first = json["daily"][0]["hours"][0]["time"].as_str().unwrap();
    let first: chrono::DateTime<chrono::Utc> = first.parse().unwrap();
    assert!(first <= requested_at);
    assert!(requested_at - first < chrono::Duration::hours(1));
}

#[tokio::test]
async fn test_range_by_dates() {
    let (app, _) = greece_app();
    let today = chrono::Utc::now().date_naive();
    let tomorrow = today.succ_opt().unwrap();
    let uri = format!(
        "/weather/range?city=Thessaloniki&start={}&end={}",
        today, tomorrow
    );

    let (status, json) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let days = json["daily"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[1]["date"], tomorrow.to_string());
    assert_eq!(days[1]["hours"].as_array().unwrap().len(), 24);
    let total = days[1]["precipitation"]["value"].as_f64().unwrap();
    assert!((total - 24.0 * 0.36).abs() < 1e-6);
}

#[tokio::test]
async fn test_range_validation() {
    let (app, _) = greece_app();

    let (status, _) =
        get_json(&app, "/weather/range?city=Athens&start=2030-01-02&end=2030-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather/range?city=Athens&start=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Valid window with no tiles.
    let (status, _) =
        get_json(&app, "/weather/range?city=Athens&start=2001-01-01&end=2001-01-02").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Bulk
// ============================================================================

#[tokio::test]
async fn test_bulk_preserves_order_and_isolates_failures() {
    let (app, _) = greece_app();
    let (status, json) = get_json(
        &app,
        "/weather/bulk?cities=Athens,Nonexistent,Thessaloniki",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["city"], "Athens");
    assert_eq!(results[1]["city"], "Nonexistent");
    assert_eq!(results[2]["city"], "Thessaloniki");

    assert!(results[0].get("weather").is_some());
    assert!(results[0].get("error").is_none());
    assert!(results[1].get("weather").is_none());
    assert!(results[1]["error"].as_str().unwrap().contains("Nonexistent"));
    assert!(results[2].get("weather").is_some());
}

#[tokio::test]
async fn test_bulk_trims_names() {
    let (app, _) = greece_app();
    let (_, json) = get_json(&app, "/weather/bulk?cities=%20Athens%20,,Thessaloniki").await;

    assert_eq!(json["count"], 2);
    assert_eq!(json["results"][0]["city"], "Athens");
}

#[tokio::test]
async fn test_bulk_hides_driver_errors() {
    let (app, _) = app_with(
        fixtures::greece(chrono::Utc::now()).with_failing_cell(ids::CELL_ATHENS),
    );
    let (status, body) = get(&app, "/weather/bulk?cities=Athens,Thessaloniki").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(DRIVER_ERROR_TEXT));
    assert!(!body.contains("Connection reset"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["results"][0]["error"], "Internal server error");
    assert!(json["results"][1].get("weather").is_some());
}

#[tokio::test]
async fn test_bulk_requires_cities() {
    let (app, _) = greece_app();

    let (status, _) = get_json(&app, "/weather/bulk").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather/bulk?cities=,,").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Multi-city scans
// ============================================================================

#[tokio::test]
async fn test_cities_snapshot_sorted_and_filtered() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather/cities").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["cities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    // Patras has no tiles and Megisti no nearby cell.
    assert_eq!(names, vec!["Athens", "City X", "Thessaloniki"]);
    assert_eq!(json["count"], 3);
}

#[tokio::test]
async fn test_cities_snapshot_drops_failing_city() {
    let (app, _) = app_with(
        fixtures::greece(chrono::Utc::now()).with_failing_cell(ids::CELL_THESSALONIKI),
    );
    let (status, body) = get(&app, "/weather/cities").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Thessaloniki"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_precipitation_threshold_only_city_x() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather/precipitation?threshold=0.5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 0.5);
    assert_eq!(json["hours"], 24);
    let places = json["places"].as_array().unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0]["name"], "City X");

    let forecasts = places[0]["forecasts"].as_array().unwrap();
    let rates: Vec<f64> = forecasts
        .iter()
        .map(|f| f["precipitation"].as_f64().unwrap())
        .collect();
    assert!(rates.iter().all(|r| *r > 0.5));
    assert!(rates.windows(2).all(|w| w[0] >= w[1]));
    let peak = places[0]["peak_precipitation"].as_f64().unwrap();
    assert!((peak - 2.16).abs() < 1e-9);
}

#[tokio::test]
async fn test_precipitation_sorted_by_peak() {
    let (app, _) = greece_app();
    let (_, json) = get_json(&app, "/weather/precipitation?threshold=0.3").await;

    let names: Vec<&str> = json["places"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["City X", "Thessaloniki"]);
}

#[tokio::test]
async fn test_precipitation_invalid_threshold_uses_default() {
    let (app, _) = greece_app();
    let (status, json) = get_json(&app, "/weather/precipitation?threshold=-1&hours=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 0.5);
    assert_eq!(json["hours"], 24);
}

#[tokio::test]
async fn test_precipitation_store_failure_is_internal() {
    let (app, _) = app_with(
        fixtures::greece(chrono::Utc::now()).with_failing_cell(ids::CELL_CITY_X),
    );
    let (status, body) = get(&app, "/weather/precipitation").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains(DRIVER_ERROR_TEXT));
}

// ============================================================================
// Map and alerts
// ============================================================================

#[tokio::test]
async fn test_map_requires_valid_bbox() {
    let (app, _) = greece_app();

    let (status, _) = get_json(&app, "/weather/map").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather/map?bbox=34,19,42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/weather/map?bbox=42,19,34,30").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get_json(&app, "/weather/map?bbox=34,19,42,30&zoom=6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"].as_array().unwrap().len(), 0);
    assert_eq!(json["properties"]["zoom"], 6);
}

#[tokio::test]
async fn test_alerts_placeholder() {
    let (app, _) = greece_app();

    let (status, json) = get_json(&app, "/weather/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["region"], "Greece");
    assert_eq!(json["alerts"].as_array().unwrap().len(), 0);

    let (_, json) = get_json(&app, "/weather/alerts?region=Crete").await;
    assert_eq!(json["region"], "Crete");
}

// ============================================================================
// Store outages
// ============================================================================

#[tokio::test]
async fn test_offline_store_returns_generic_500() {
    let (app, store) = greece_app();
    store.set_offline(true);

    let (status, body) = get(&app, "/weather?city=Athens").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("Connection reset"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "Internal server error");

    store.set_offline(false);
    let (status, _) = get(&app, "/weather?city=Athens").await;
    assert_eq!(status, StatusCode::OK);
}
