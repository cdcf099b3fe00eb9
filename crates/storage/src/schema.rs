/// Database schema SQL. Every statement is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;

CREATE TABLE IF NOT EXISTS icon_cells (
    id BIGSERIAL PRIMARY KEY,
    cell_name VARCHAR(100) UNIQUE NOT NULL,
    boundary GEOGRAPHY(POLYGON, 4326) NOT NULL,
    is_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS icon_tile_forecasts (
    id BIGSERIAL PRIMARY KEY,
    cell_id BIGINT NOT NULL REFERENCES icon_cells(id) ON DELETE CASCADE,
    run_date DATE NOT NULL,
    utc_cycle_time VARCHAR(2) NOT NULL,
    forecast_datetime TIMESTAMPTZ NOT NULL,
    forecast_data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    UNIQUE(cell_id, forecast_datetime, run_date, utc_cycle_time)
);

CREATE TABLE IF NOT EXISTS geo_entities (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    name_en VARCHAR(255),
    name_local VARCHAR(255),
    alt_names JSONB,
    entity_type VARCHAR(100) NOT NULL,
    admin_level INTEGER,
    parent_id BIGINT REFERENCES geo_entities(id) ON DELETE SET NULL,
    country_code VARCHAR(2),
    geometry GEOGRAPHY(GEOMETRY, 4326) NOT NULL,
    centroid GEOGRAPHY(POINT, 4326),
    timezone VARCHAR(100),
    population BIGINT,
    is_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    cell_id BIGINT REFERENCES icon_cells(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_icon_cells_boundary ON icon_cells USING GIST(boundary);
CREATE INDEX IF NOT EXISTS idx_icon_tile_forecasts_forecast_datetime ON icon_tile_forecasts(forecast_datetime);
CREATE INDEX IF NOT EXISTS idx_icon_tile_forecasts_run ON icon_tile_forecasts(cell_id, run_date DESC, utc_cycle_time DESC);
CREATE INDEX IF NOT EXISTS idx_geo_entities_name ON geo_entities(name);
CREATE INDEX IF NOT EXISTS idx_geo_entities_name_en ON geo_entities(name_en);
CREATE INDEX IF NOT EXISTS idx_geo_entities_entity_type ON geo_entities(entity_type);
CREATE INDEX IF NOT EXISTS idx_geo_entities_parent_id ON geo_entities(parent_id);
CREATE INDEX IF NOT EXISTS idx_geo_entities_geometry ON geo_entities USING GIST((geometry::geometry));
CREATE INDEX IF NOT EXISTS idx_geo_entities_centroid ON geo_entities USING GIST((centroid::geometry))
"#;
