//! Common test fixtures for rain-zones tests.
//!
//! This module provides pre-defined catalogs, hosts and bounding boxes that
//! represent the scenarios the extraction engine is exercised against.

use radar_common::{Catalog, Frame, TileAddress};
use radar_source::{tile_url, TileRenderParams};

/// Catalog URL served by [`crate::MockHttp`] in tests.
pub const CATALOG_URL: &str = "https://catalog.test/public/weather-maps.json";

/// Tile host named in generated catalogs.
pub const TILE_HOST: &str = "https://tiles.test";

/// Path fragment used for a frame with the given timestamp.
pub fn frame_path(timestamp: i64) -> String {
    format!("/v2/radar/{}", timestamp)
}

pub fn frame(timestamp: i64) -> Frame {
    Frame::new(timestamp, frame_path(timestamp))
}

/// A catalog with the given past and nowcast timestamps.
pub fn catalog(past: &[i64], nowcast: &[i64]) -> Catalog {
    Catalog {
        tile_host: TILE_HOST.to_string(),
        past_frames: past.iter().copied().map(frame).collect(),
        forecast_frames: nowcast.iter().copied().map(frame).collect(),
        generated: None,
    }
}

/// The catalog JSON document a provider would serve for these timestamps.
pub fn catalog_json(past: &[i64], nowcast: &[i64]) -> String {
    let frames = |times: &[i64]| -> Vec<serde_json::Value> {
        times
            .iter()
            .map(|&t| serde_json::json!({ "time": t, "path": frame_path(t) }))
            .collect()
    };

    serde_json::json!({
        "version": "2.0",
        "generated": past.last().copied().unwrap_or(0),
        "host": TILE_HOST,
        "radar": {
            "past": frames(past),
            "nowcast": frames(nowcast),
        },
        "satellite": { "infrared": [] },
    })
    .to_string()
}

/// URL the engine requests for `tile` of the frame at `timestamp`, using the
/// default render parameters.
pub fn tile_url_for(timestamp: i64, tile: &TileAddress) -> String {
    tile_url(TILE_HOST, &frame(timestamp), tile, &TileRenderParams::default())
}

/// Prefix shared by every tile URL of one frame.
pub fn frame_url_prefix(timestamp: i64) -> String {
    format!("{}{}/", TILE_HOST, frame_path(timestamp))
}

/// Common timestamps for testing (ten-minute cadence).
pub mod times {
    pub const PAST: [i64; 4] = [1_700_000_000, 1_700_000_600, 1_700_001_200, 1_700_001_800];
    pub const NOWCAST: [i64; 2] = [1_700_002_400, 1_700_003_000];
}

/// Common bounding box definitions as (north, south, east, west).
pub mod bbox {
    /// Central Paris
    pub const PARIS: (f64, f64, f64, f64) = (48.9, 48.6, 2.55, 2.1);

    /// Western Europe
    pub const EUROPE: (f64, f64, f64, f64) = (60.0, 36.0, 20.0, -10.0);

    /// Whole Web Mercator world
    pub const WORLD: (f64, f64, f64, f64) = (85.0, -85.0, 180.0, -180.0);

    /// Degenerate single point
    pub const POINT: (f64, f64, f64, f64) = (45.0, 45.0, 5.0, 5.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_json_parses() {
        let json = catalog_json(&times::PAST, &times::NOWCAST);
        let parsed = radar_source::parse_catalog(json.as_bytes()).unwrap();
        assert_eq!(parsed, {
            let mut c = catalog(&times::PAST, &times::NOWCAST);
            c.generated = Some(times::PAST[3]);
            c
        });
    }

    #[test]
    fn test_tile_url_has_frame_prefix() {
        let url = tile_url_for(42, &TileAddress::new(9, 1, 2));
        assert!(url.starts_with(&frame_url_prefix(42)));
    }
}
