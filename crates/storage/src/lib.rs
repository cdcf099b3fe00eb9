//! Storage for Kairos services.
//!
//! Provides:
//! - Store traits for places, cells and forecast tiles
//! - PostgreSQL/PostGIS implementations of those traits
//! - Pool setup and idempotent schema creation

pub mod cells;
pub mod database;
pub mod geo_entities;
mod schema;
pub mod store;
pub mod tiles;

pub use cells::PgCellStore;
pub use database::Database;
pub use geo_entities::PgGeoEntityStore;
pub use store::{CellStore, DataStatus, GeoEntityStore, StoreHealth, TileStore};
pub use tiles::PgTileStore;
