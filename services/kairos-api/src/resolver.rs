//! Location resolution: city names and coordinates to forecast cells.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use kairos_common::{Cell, GeoEntity, GeoPoint, KairosError, KairosResult};
use storage::{CellStore, GeoEntityStore};

use crate::resolution_cache::ResolutionCache;

/// Where a request wants weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates { latitude: f64, longitude: f64 },
}

/// A resolved cell plus the place that named it, if any.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub cell: Cell,
    pub place: Option<GeoEntity>,
    /// The point asked for, on coordinate queries.
    pub requested: Option<GeoPoint>,
}

impl Resolution {
    /// Display name of the place, or the cell name for bare coordinates.
    pub fn label(&self) -> &str {
        self.place
            .as_ref()
            .map(GeoEntity::display_name)
            .unwrap_or(&self.cell.name)
    }
}

/// Spellings tried for a city name, in order, without duplicates.
///
/// Literal, lowercase, uppercase, title case ("new york" -> "New York") and
/// first-letter-only ("new york" -> "New york").
pub fn name_variants(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let candidates = [
        name.to_string(),
        lower.clone(),
        name.to_uppercase(),
        title_case(&lower),
        capitalize_first(&lower),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolves user input against the place hierarchy and the cell index.
pub struct LocationResolver {
    places: Arc<dyn GeoEntityStore>,
    cells: Arc<dyn CellStore>,
    cache: ResolutionCache,
}

impl LocationResolver {
    pub fn new(
        places: Arc<dyn GeoEntityStore>,
        cells: Arc<dyn CellStore>,
        cache: ResolutionCache,
    ) -> Self {
        Self {
            places,
            cells,
            cache,
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub async fn resolve(&self, query: &LocationQuery) -> KairosResult<Resolution> {
        match query {
            LocationQuery::City(name) => self.resolve_name(name).await,
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => self.resolve_coordinates(*latitude, *longitude).await,
        }
    }

    /// Exact match on any name column, trying each spelling variant in turn.
    #[instrument(skip(self))]
    pub async fn resolve_name(&self, name: &str) -> KairosResult<Resolution> {
        let name = name.trim();
        if name.is_empty() {
            return Err(KairosError::MissingParameter("city".to_string()));
        }

        if let Some(hit) = self.cache.get(name).await {
            return Ok(hit);
        }

        let mut place = None;
        for variant in name_variants(name) {
            if let Some(found) = self.places.find_by_exact_name(&variant).await? {
                debug!(variant = %variant, place_id = found.id, "Matched place name");
                place = Some(found);
                break;
            }
        }
        let place = place.ok_or_else(|| KairosError::LocationNotFound(name.to_string()))?;

        let cell = match self.precomputed_cell(&place).await? {
            Some(cell) => Some(cell),
            None => match place.centroid {
                Some(centroid) => self.cells.find_containing(centroid).await?,
                None => None,
            },
        };
        let cell = cell.ok_or_else(|| {
            KairosError::LocationNotFound(format!("{} is outside forecast coverage", name))
        })?;

        let resolution = Resolution {
            cell,
            place: Some(place),
            requested: None,
        };
        self.cache.put(name, resolution.clone()).await;
        Ok(resolution)
    }

    /// The most specific enabled place containing the point names the
    /// result; the cell comes from a city's association or from containment.
    #[instrument(skip(self))]
    pub async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> KairosResult<Resolution> {
        let point = GeoPoint::validated(latitude, longitude)?;

        let place = self
            .places
            .find_by_coordinates(point, 10)
            .await?
            .into_iter()
            .find(|p| p.is_enabled);

        // Only cities carry a stored cell association worth trusting here.
        let precomputed = match place.as_ref().filter(|p| p.is_city()) {
            Some(city) => self.precomputed_cell(city).await?,
            None => None,
        };
        let cell = match precomputed {
            Some(cell) => cell,
            None => self.cells.find_containing(point).await?.ok_or_else(|| {
                KairosError::LocationNotFound(format!(
                    "no forecast cell covers {:.4},{:.4}",
                    latitude, longitude
                ))
            })?,
        };

        Ok(Resolution {
            cell,
            place,
            requested: Some(point),
        })
    }

    /// The place's stored cell association, if it still points at an
    /// enabled cell.
    async fn precomputed_cell(&self, place: &GeoEntity) -> KairosResult<Option<Cell>> {
        let Some(cell_id) = place.cell_id else {
            return Ok(None);
        };
        let cell = self.cells.find_by_id(cell_id).await?;
        Ok(cell.filter(|c| c.is_enabled))
    }
}
