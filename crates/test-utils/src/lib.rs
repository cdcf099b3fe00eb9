//! Shared test utilities for the Kairos workspace.
//!
//! This crate provides:
//! - [`InMemoryStore`], implementing every store trait without a database
//! - Seeded Greek places, cells and forecast tiles
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! ```ignore
//! let store = Arc::new(test_utils::fixtures::greece(Utc::now()));
//! ```

pub mod fixtures;
pub mod memory;

pub use memory::{InMemoryStore, DRIVER_ERROR_TEXT};

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(weather.temperature, 20.0, 0.01);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use kairos_common::GeoPoint;
    use storage::{CellStore, GeoEntityStore, TileStore};

    use super::fixtures::{self, ids};

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[tokio::test]
    async fn test_exact_name_prefers_enabled() {
        let store = fixtures::greece(Utc::now());
        let found = GeoEntityStore::find_by_exact_name(&store, "Athens")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, ids::ATHENS);
    }

    #[tokio::test]
    async fn test_overlapping_cells_pick_lowest_id() {
        let store = fixtures::greece(Utc::now());
        let cell = store
            .find_containing(GeoPoint::new(38.0, 23.92))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cell.id, ids::CELL_ATHENS);
    }

    #[tokio::test]
    async fn test_disabled_cells_are_invisible() {
        let store = fixtures::greece(Utc::now());
        assert!(store
            .find_containing(GeoPoint::new(35.1, 25.1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_range_prefers_newest_run() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 20, 0).unwrap();
        let store = Arc::new(fixtures::greece(now));
        let tiles = store
            .tiles_in_range(ids::CELL_ATHENS, now, now + Duration::hours(6))
            .await
            .unwrap();
        assert_eq!(tiles.len(), 6);
        assert!(tiles.iter().all(|t| t.forecast_data["t_2m"] == 293.15));
    }

    #[tokio::test]
    async fn test_delete_before() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 20, 0).unwrap();
        let store = fixtures::greece(now);
        let before = store.tile_count().await;
        let deleted = store
            .delete_before(fixtures::hour_floor(now) + Duration::hours(2))
            .await
            .unwrap();
        // two instants for each of four cell/run series
        assert_eq!(deleted, 8);
        assert_eq!(store.tile_count().await, before - 8);
    }
}
