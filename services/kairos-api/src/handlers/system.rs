//! Operational status endpoint.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use kairos_common::BoundingBox;
use storage::DataStatus;

use super::{json_response, record_request};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CoverageInfo {
    pub model: String,
    pub region: String,
    pub bbox: BoundingBox,
    pub resolution: f64,
}

#[derive(Debug, Serialize)]
pub struct SystemResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_seconds: i64,
    pub database_status: &'static str,
    /// `available`, `no_data` or `unavailable`.
    pub icon_data_status: &'static str,
    pub last_forecast_run: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub cells_with_data: i64,
    pub tile_count: i64,
    pub enabled_cells: Option<i64>,
    pub coverage: CoverageInfo,
}

/// GET /system
///
/// Always 200; store failures are reported in the body and logged.
pub async fn system_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    const ENDPOINT: &str = "system";
    record_request(ENDPOINT);

    let now = Utc::now();

    let database_status = match state.health.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!(error = %e, "Database ping failed");
            "unavailable"
        }
    };

    let (icon_data_status, data) = match state.tiles.data_status().await {
        Ok(data) if data.tile_count > 0 => ("available", data),
        Ok(data) => ("no_data", data),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read forecast data status");
            ("unavailable", DataStatus::default())
        }
    };

    let enabled_cells = match state.cells.count_enabled().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::error!(error = %e, "Failed to count cells");
            None
        }
    };

    let coverage = &state.config.coverage;
    let response = SystemResponse {
        status: if database_status == "connected" {
            "ok"
        } else {
            "degraded"
        },
        timestamp: now,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
        database_status,
        icon_data_status,
        last_forecast_run: data.latest_run.as_ref().map(|r| r.to_compact()),
        last_update: data.last_update,
        cells_with_data: data.cells_with_data,
        tile_count: data.tile_count,
        enabled_cells,
        coverage: CoverageInfo {
            model: coverage.model.clone(),
            region: coverage.region.clone(),
            bbox: coverage.bbox,
            resolution: coverage.resolution,
        },
    };

    json_response(StatusCode::OK, &response)
}
