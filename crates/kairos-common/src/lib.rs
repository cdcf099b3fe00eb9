//! Common types shared across the Kairos crates and services.

pub mod bbox;
pub mod error;
pub mod geo;
pub mod responses;
pub mod tile;

pub use bbox::BoundingBox;
pub use error::{ErrorKind, KairosError, KairosResult};
pub use geo::{Cell, GeoEntity, GeoPoint};
pub use responses::ExceptionResponse;
pub use tile::{ForecastTile, NewForecastTile, RunId};
