//! PostgreSQL/PostGIS implementation of [`GeoEntityStore`].

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use kairos_common::{GeoEntity, GeoPoint, KairosError, KairosResult};

use crate::store::GeoEntityStore;

const ENTITY_COLUMNS: &str = "id, name, name_en, name_local, alt_names::text AS alt_names, \
     entity_type, admin_level, parent_id, country_code, \
     ST_Y(centroid::geometry) AS latitude, ST_X(centroid::geometry) AS longitude, \
     timezone, population, is_enabled, cell_id";

pub struct PgGeoEntityStore {
    pool: PgPool,
}

impl PgGeoEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl GeoEntityStore for PgGeoEntityStore {
    async fn list(
        &self,
        entity_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> KairosResult<Vec<GeoEntity>> {
        let rows = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities \
             WHERE ($1::text IS NULL OR entity_type = $1) \
             ORDER BY name, id LIMIT $2 OFFSET $3",
            ENTITY_COLUMNS
        ))
        .bind(entity_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_by_id(&self, id: i64) -> KairosResult<Option<GeoEntity>> {
        let row = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities WHERE id = $1",
            ENTITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    #[instrument(skip(self))]
    async fn find_by_exact_name(&self, name: &str) -> KairosResult<Option<GeoEntity>> {
        let row = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities \
             WHERE name = $1 OR name_en = $1 OR name_local = $1 \
             ORDER BY is_enabled DESC, (entity_type = 'city') DESC, \
                      population DESC NULLS LAST, id ASC \
             LIMIT 1",
            ENTITY_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn search(&self, query: &str, limit: i64) -> KairosResult<Vec<GeoEntity>> {
        let rows = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities \
             WHERE name ILIKE $1 OR name_en ILIKE $1 OR name_local ILIKE $1 \
                   OR alt_names::text ILIKE $1 \
             ORDER BY \
                CASE WHEN name ILIKE $2 THEN 0 \
                     WHEN name ILIKE $1 THEN 1 \
                     WHEN name_en ILIKE $2 THEN 2 \
                     WHEN name_en ILIKE $1 THEN 3 \
                     WHEN name_local ILIKE $2 THEN 4 \
                     WHEN name_local ILIKE $1 THEN 5 \
                     ELSE 6 \
                END, \
                population DESC NULLS LAST, id ASC \
             LIMIT $3",
            ENTITY_COLUMNS
        ))
        .bind(like_pattern(query))
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_coordinates(
        &self,
        point: GeoPoint,
        limit: i64,
    ) -> KairosResult<Vec<GeoEntity>> {
        // PostGIS takes (lon, lat)
        let rows = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities \
             WHERE ST_Contains(geometry::geometry, ST_SetSRID(ST_MakePoint($1, $2), 4326)) \
             ORDER BY admin_level DESC NULLS LAST, population DESC NULLS LAST, id ASC \
             LIMIT $3",
            ENTITY_COLUMNS
        ))
        .bind(point.longitude)
        .bind(point.latitude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_children(&self, parent_id: i64) -> KairosResult<Vec<GeoEntity>> {
        let rows = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities WHERE parent_id = $1 ORDER BY admin_level, name, id",
            ENTITY_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn enabled_cities(&self) -> KairosResult<Vec<GeoEntity>> {
        let rows = sqlx::query_as::<_, GeoEntityRow>(&format!(
            "SELECT {} FROM geo_entities \
             WHERE entity_type = 'city' AND is_enabled AND centroid IS NOT NULL \
             ORDER BY id",
            ENTITY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KairosError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

/// Internal row type for database queries.
#[derive(FromRow)]
struct GeoEntityRow {
    id: i64,
    name: String,
    name_en: Option<String>,
    name_local: Option<String>,
    alt_names: Option<String>,
    entity_type: String,
    admin_level: Option<i32>,
    parent_id: Option<i64>,
    country_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    population: Option<i64>,
    is_enabled: bool,
    cell_id: Option<i64>,
}

/// `alt_names` is a JSON array of strings; anything else is ignored.
fn parse_alt_names(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|text| serde_json::from_str::<Vec<String>>(text).ok())
        .unwrap_or_default()
}

impl From<GeoEntityRow> for GeoEntity {
    fn from(row: GeoEntityRow) -> Self {
        let centroid = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        GeoEntity {
            id: row.id,
            name: row.name,
            name_en: row.name_en,
            name_local: row.name_local,
            alt_names: parse_alt_names(row.alt_names.as_deref()),
            entity_type: row.entity_type,
            admin_level: row.admin_level.unwrap_or(0),
            parent_id: row.parent_id,
            country_code: row.country_code,
            centroid,
            timezone: row.timezone,
            population: row.population,
            is_enabled: row.is_enabled,
            cell_id: row.cell_id,
        }
    }
}
