//! Kairos API Service Library
//!
//! HTTP surface over the Kairos forecast store: location resolution, point
//! and range forecasts, multi-city scans and place browsing.

pub mod config;
pub mod engine;
pub mod handlers;
pub mod resolution_cache;
pub mod resolver;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router with its middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Weather
        .route("/weather", get(handlers::weather::weather_handler))
        .route(
            "/weather/current",
            get(handlers::weather::current_handler),
        )
        .route(
            "/weather/forecast",
            get(handlers::weather::forecast_handler),
        )
        .route("/weather/range", get(handlers::weather::range_handler))
        .route("/weather/bulk", get(handlers::weather::bulk_handler))
        .route("/weather/cities", get(handlers::weather::cities_handler))
        .route(
            "/weather/precipitation",
            get(handlers::weather::precipitation_handler),
        )
        .route("/weather/map", get(handlers::weather::map_handler))
        .route("/weather/alerts", get(handlers::weather::alerts_handler))
        // Places
        .route("/places", get(handlers::places::list_places_handler))
        .route(
            "/places/search",
            get(handlers::places::search_places_handler),
        )
        .route(
            "/places/coordinates",
            get(handlers::places::places_by_coordinates_handler),
        )
        .route("/places/:id", get(handlers::places::get_place_handler))
        .route(
            "/places/:id/children",
            get(handlers::places::place_children_handler),
        )
        // Operational
        .route("/system", get(handlers::system::system_handler))
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
