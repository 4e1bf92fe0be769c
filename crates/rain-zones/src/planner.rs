//! Tile grid planning: bounding box to zoom level and tile rectangle.
//!
//! The planner starts at the finest zoom, backs off while the box is wider
//! than `max_tiles_across` tiles, then keeps backing off while the tile
//! rectangle exceeds the tile budget. The budget is never reported as an
//! error; resolution is traded for a bounded download.

use radar_common::tile::{lat_to_tile_y, lon_to_tile_x, tiles_per_axis};
use radar_common::{BoundingBox, EngineConfig, TileRange};
use tracing::debug;

/// Initial zoom from the east-west span alone.
pub fn choose_zoom(bbox: &BoundingBox, config: &EngineConfig) -> u32 {
    let min_zoom = config.min_zoom.min(config.max_zoom);
    let lon_span = bbox.lon_span().abs();
    let mut zoom = config.max_zoom;
    while zoom > min_zoom {
        let tile_width = 360.0 / tiles_per_axis(zoom) as f64;
        if lon_span / tile_width <= config.max_tiles_across {
            break;
        }
        zoom -= 1;
    }
    zoom
}

/// Tile rectangle covering `bbox` at `zoom`. The box must be normalized.
pub fn tile_range(bbox: &BoundingBox, zoom: u32) -> TileRange {
    TileRange {
        zoom,
        x_min: lon_to_tile_x(bbox.west, zoom),
        x_max: lon_to_tile_x(bbox.east, zoom),
        y_min: lat_to_tile_y(bbox.north, zoom),
        y_max: lat_to_tile_y(bbox.south, zoom),
    }
}

/// Plan the tile rectangle for one extraction.
pub fn plan(bbox: &BoundingBox, config: &EngineConfig) -> TileRange {
    let bbox = bbox.normalized();
    let min_zoom = config.min_zoom.min(config.max_zoom);

    let initial = choose_zoom(&bbox, config);
    let mut range = tile_range(&bbox, initial);
    while range.tile_count() > config.max_tiles && range.zoom > min_zoom {
        range = tile_range(&bbox, range.zoom - 1);
    }

    debug!(
        initial_zoom = initial,
        zoom = range.zoom,
        columns = range.columns(),
        rows = range.rows(),
        tiles = range.tile_count(),
        "Tile grid planned"
    );
    range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_box_stays_at_max_zoom() {
        let bbox = BoundingBox::new(48.9, 48.6, 2.55, 2.1);
        let range = plan(&bbox, &EngineConfig::default());
        assert_eq!(range.zoom, 9);
        assert_eq!((range.x_min, range.x_max), (258, 259));
        assert_eq!((range.y_min, range.y_max), (176, 176));
    }

    #[test]
    fn test_wide_box_lowers_zoom() {
        // 30 degrees is ~42 tiles at z9 and ~10.7 at z7.
        let bbox = BoundingBox::new(50.0, 49.0, 20.0, -10.0);
        assert_eq!(choose_zoom(&bbox, &EngineConfig::default()), 7);
    }

    #[test]
    fn test_tall_box_hits_budget() {
        // Narrow but very tall: passes the width check, fails the budget.
        let bbox = BoundingBox::new(70.0, -70.0, 1.0, 0.0);
        let config = EngineConfig::default();
        assert_eq!(choose_zoom(&bbox, &config), 9);
        let range = plan(&bbox, &config);
        assert!(range.zoom < 9);
        assert!(range.tile_count() <= config.max_tiles);
    }

    #[test]
    fn test_corner_order_does_not_matter() {
        let config = EngineConfig::default();
        let a = plan(&BoundingBox::from_corners(48.9, 2.1, 48.6, 2.55), &config);
        let b = plan(&BoundingBox::from_corners(48.6, 2.55, 48.9, 2.1), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_budget_holds_over_box_grid() {
        let config = EngineConfig::default();
        for south in [-80.0_f64, -45.0, -10.0, 0.0, 30.0, 60.0] {
            for height in [0.01_f64, 0.5, 3.0, 15.0, 40.0] {
                for west in [-179.0_f64, -90.0, -3.0, 0.0, 45.0, 120.0] {
                    for width in [0.01_f64, 0.5, 4.0, 20.0, 90.0, 300.0] {
                        let bbox = BoundingBox::new(
                            (south + height).min(85.0),
                            south,
                            (west + width).min(180.0),
                            west,
                        );
                        let range = plan(&bbox, &config);
                        assert!(range.zoom >= config.min_zoom && range.zoom <= config.max_zoom);
                        assert!(
                            range.tile_count() <= config.max_tiles,
                            "{:?} planned {:?}",
                            bbox,
                            range
                        );
                        assert!(range.x_min <= range.x_max && range.y_min <= range.y_max);
                    }
                }
            }
        }
    }

    #[test]
    fn test_world_box_falls_to_min_zoom() {
        let bbox = BoundingBox::new(85.0, -85.0, 180.0, -180.0);
        let range = plan(&bbox, &EngineConfig::default());
        assert_eq!(range.zoom, 3);
        assert_eq!(range.tile_count(), 64);
    }
}
