//! Place browsing endpoints (read-only).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use serde::{Deserialize, Serialize};

use kairos_common::{GeoEntity, GeoPoint, KairosError, KairosResult};

use super::{parse_f64, record_request, respond};
use crate::engine::clamp_count;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaceListResponse {
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
    pub places: Vec<GeoEntity>,
}

/// GET /places?limit=&offset=&type=
pub async fn list_places_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    const ENDPOINT: &str = "places";
    record_request(ENDPOINT);

    let limit = clamp_count(params.limit.as_deref(), 100, 1000);
    let offset = params
        .offset
        .as_deref()
        .and_then(|o| o.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);
    let entity_type = params
        .entity_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let result = state
        .places
        .list(entity_type, limit, offset)
        .await
        .map(|places| PlaceListResponse {
            count: places.len(),
            limit,
            offset,
            places,
        });
    respond(ENDPOINT, result)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaceSearchResponse {
    pub query: String,
    pub count: usize,
    pub places: Vec<GeoEntity>,
}

/// GET /places/search?q=&limit=
pub async fn search_places_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    const ENDPOINT: &str = "places_search";
    record_request(ENDPOINT);
    respond(ENDPOINT, search(&state, &params).await)
}

async fn search(state: &AppState, params: &SearchParams) -> KairosResult<PlaceSearchResponse> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| KairosError::MissingParameter("q".to_string()))?;
    let limit = clamp_count(params.limit.as_deref(), 20, 100);

    let places = state.places.search(query, limit).await?;
    Ok(PlaceSearchResponse {
        query: query.to_string(),
        count: places.len(),
        places,
    })
}

#[derive(Debug, Deserialize)]
pub struct CoordinateParams {
    pub lat: Option<String>,
    #[serde(alias = "lon")]
    pub lng: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlacesAtResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub places: Vec<GeoEntity>,
}

/// GET /places/coordinates?lat=&lng=&limit=
pub async fn places_by_coordinates_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CoordinateParams>,
) -> Response {
    const ENDPOINT: &str = "places_coordinates";
    record_request(ENDPOINT);
    respond(ENDPOINT, places_at(&state, &params).await)
}

async fn places_at(
    state: &AppState,
    params: &CoordinateParams,
) -> KairosResult<PlacesAtResponse> {
    let lat = params
        .lat
        .as_deref()
        .ok_or_else(|| KairosError::MissingParameter("lat".to_string()))?;
    let lng = params
        .lng
        .as_deref()
        .ok_or_else(|| KairosError::MissingParameter("lng".to_string()))?;
    let point = GeoPoint::validated(parse_f64("lat", lat)?, parse_f64("lng", lng)?)?;
    let limit = clamp_count(params.limit.as_deref(), 10, 50);

    let places = state.places.find_by_coordinates(point, limit).await?;
    if places.is_empty() {
        return Err(KairosError::NotFound(format!(
            "no places at {},{}",
            point.latitude, point.longitude
        )));
    }

    Ok(PlacesAtResponse {
        latitude: point.latitude,
        longitude: point.longitude,
        count: places.len(),
        places,
    })
}

fn parse_id(raw: &str) -> KairosResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| KairosError::invalid("id", format!("'{}' is not a place id", raw)))
}

/// GET /places/:id
pub async fn get_place_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    const ENDPOINT: &str = "place";
    record_request(ENDPOINT);
    respond(ENDPOINT, get_place(&state, &id).await)
}

async fn get_place(state: &AppState, raw_id: &str) -> KairosResult<GeoEntity> {
    let id = parse_id(raw_id)?;
    state
        .places
        .find_by_id(id)
        .await?
        .ok_or_else(|| KairosError::NotFound(format!("place {}", id)))
}

#[derive(Debug, Serialize)]
pub struct ChildrenResponse {
    pub parent_id: i64,
    pub count: usize,
    pub children: Vec<GeoEntity>,
}

/// GET /places/:id/children
pub async fn place_children_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    const ENDPOINT: &str = "place_children";
    record_request(ENDPOINT);
    respond(ENDPOINT, children(&state, &id).await)
}

async fn children(state: &AppState, raw_id: &str) -> KairosResult<ChildrenResponse> {
    let parent = get_place(state, raw_id).await?;
    let children = state.places.find_children(parent.id).await?;
    Ok(ChildrenResponse {
        parent_id: parent.id,
        count: children.len(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert_eq!(parse_id("athens").unwrap_err().http_status_code(), 400);
    }
}
