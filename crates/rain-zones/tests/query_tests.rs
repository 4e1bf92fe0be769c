//! Point queries, the multi-frame timeline, corridor boxes and tile passthrough.

use std::sync::Arc;

use radar_common::{EngineConfig, FrameSelection, GeoPoint, RadarError, TileAddress, TimeMode};
use radar_source::{HttpFetch, TileRenderOverrides};
use rain_zones::{RainZoneEngine, DEFAULT_CORRIDOR_MARGIN_KM};
use test_utils::{
    catalog_json, frame_url_prefix, opaque_tile_png, tile_png_with, tile_url_for, times, MockHttp, CATALOG_URL,
    TILE_HOST,
};

fn engine(http: &Arc<MockHttp>) -> RainZoneEngine {
    let dyn_http: Arc<dyn HttpFetch> = http.clone();
    RainZoneEngine::new(
        dyn_http,
        EngineConfig {
            catalog_url: CATALOG_URL.to_string(),
            ..Default::default()
        },
    )
}

fn mock_with_catalog(past: &[i64], nowcast: &[i64]) -> Arc<MockHttp> {
    let http = Arc::new(MockHttp::new());
    http.serve(CATALOG_URL, catalog_json(past, nowcast));
    http
}

// Tile 259/176 at z9 contains central Paris. Longitude 2.35 falls at
// in-tile column ~87, longitude 2.5 at column ~142.
const PARIS_TILE: (u32, u32, u32) = (9, 259, 176);

fn paris_tile() -> TileAddress {
    TileAddress::new(PARIS_TILE.0, PARIS_TILE.1, PARIS_TILE.2)
}

fn west_half_wet() -> Vec<u8> {
    tile_png_with(256, |x, _| if x < 128 { 255 } else { 0 })
}

// ============================================================================
// Point queries
// ============================================================================

#[tokio::test]
async fn test_point_query_reads_sampled_pixel() {
    let oldest = times::PAST[0];
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    http.serve(tile_url_for(oldest, &paris_tile()), west_half_wet());

    let engine = engine(&http);
    assert!(engine.is_raining_at(48.85, 2.35).await.unwrap());
    assert!(!engine.is_raining_at(48.85, 2.5).await.unwrap());
    assert_eq!(http.requests_with_prefix(&frame_url_prefix(oldest)), 2);
}

#[tokio::test]
async fn test_point_query_uses_selection() {
    let latest = times::PAST[3];
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    http.serve(tile_url_for(latest, &paris_tile()), opaque_tile_png());

    let engine = engine(&http);
    assert!(engine
        .is_raining(48.85, 2.5, &FrameSelection::LatestPast)
        .await
        .unwrap());
    // The oldest frame has no tile served: missing reads as dry.
    assert!(!engine.is_raining_at(48.85, 2.5).await.unwrap());
}

#[tokio::test]
async fn test_point_query_out_of_range_makes_no_request() {
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    let engine = engine(&http);

    assert!(!engine.is_raining_at(91.0, 0.0).await.unwrap());
    assert!(!engine.is_raining_at(0.0, -180.5).await.unwrap());
    assert_eq!(http.call_count(), 0);
}

#[tokio::test]
async fn test_point_query_beyond_mercator_is_dry() {
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    assert!(!engine(&http).is_raining_at(89.9, 10.0).await.unwrap());
    assert_eq!(http.requests_with_prefix(TILE_HOST), 0);
}

#[tokio::test]
async fn test_point_query_catalog_failure_surfaces() {
    let http = Arc::new(MockHttp::new());
    let err = engine(&http).is_raining_at(48.85, 2.35).await.unwrap_err();
    assert!(matches!(err, RadarError::Network { .. }));
}

// ============================================================================
// Timeline
// ============================================================================

#[tokio::test]
async fn test_timeline_covers_every_frame_in_order() {
    let past = [times::PAST[2], times::PAST[3]];
    let nowcast = [times::NOWCAST[0]];
    let http = mock_with_catalog(&past, &nowcast);
    // Only the middle frame has rain.
    http.serve_prefix(frame_url_prefix(times::PAST[3]), opaque_tile_png());

    let bbox = radar_common::BoundingBox::new(48.9, 48.6, 2.55, 2.1);
    let results = engine(&http).extract_all(&bbox).await.unwrap();

    let stamps: Vec<i64> = results.iter().map(|r| r.frame_timestamp).collect();
    assert_eq!(stamps, vec![times::PAST[2], times::PAST[3], times::NOWCAST[0]]);

    let modes: Vec<TimeMode> = results.iter().map(|r| r.selection_policy).collect();
    assert_eq!(modes, vec![TimeMode::PastIndex, TimeMode::PastIndex, TimeMode::FutureIndex]);

    let wet: Vec<bool> = results.iter().map(|r| !r.is_dry()).collect();
    assert_eq!(wet, vec![false, true, false]);

    // One catalog fetch for the whole timeline.
    assert_eq!(http.requests_with_prefix(CATALOG_URL), 1);
}

#[tokio::test]
async fn test_timeline_without_forecast_covers_past_only() {
    let http = mock_with_catalog(&times::PAST, &[]);
    let bbox = radar_common::BoundingBox::new(48.9, 48.6, 2.55, 2.1);
    let results = engine(&http).extract_all(&bbox).await.unwrap();

    assert_eq!(results.len(), times::PAST.len());
    assert!(results.iter().all(|r| r.selection_policy == TimeMode::PastIndex));
    assert!(results.iter().all(|r| r.frame_timestamp != 0));
}

#[tokio::test]
async fn test_timeline_without_past_frames_is_no_data() {
    let http = mock_with_catalog(&[], &times::NOWCAST);
    let bbox = radar_common::BoundingBox::new(48.9, 48.6, 2.55, 2.1);
    let err = engine(&http).extract_all(&bbox).await.unwrap_err();
    assert!(matches!(err, RadarError::NoData(_)));
}

// ============================================================================
// Corridors
// ============================================================================

#[tokio::test]
async fn test_corridor_is_simplified_and_tagged() {
    let latest = times::PAST[3];
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    http.serve_prefix(frame_url_prefix(latest), opaque_tile_png());

    let start = GeoPoint::new(48.85, 2.35);
    let end = GeoPoint::new(48.40, 2.70);
    let result = engine(&http)
        .corridor(start, end, DEFAULT_CORRIDOR_MARGIN_KM, FrameSelection::LatestPast)
        .await
        .unwrap();

    assert_eq!(result.frame_timestamp, latest);
    // Every tile is wet, so the whole grid is one rectangle.
    assert_eq!(result.polygons.len(), 1);
    assert_eq!(result.polygons[0].len(), 4);
    let b = result.polygons[0].bounds().unwrap();
    assert!(b.contains_point(start.lat, start.lon));
    assert!(b.contains_point(end.lat, end.lon));
}

#[tokio::test]
async fn test_empty_route_makes_no_request() {
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    let result = engine(&http)
        .along_route(&[], DEFAULT_CORRIDOR_MARGIN_KM, FrameSelection::LatestPast)
        .await
        .unwrap();
    assert!(result.is_dry());
    assert_eq!(http.call_count(), 0);
}

// ============================================================================
// Tile passthrough
// ============================================================================

#[tokio::test]
async fn test_oldest_past_tile_passthrough() {
    let oldest = times::PAST[0];
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    let png = opaque_tile_png();
    http.serve(tile_url_for(oldest, &TileAddress::new(5, 16, 11)), png.clone());

    let engine = engine(&http);
    let bytes = engine
        .fetch_oldest_past_tile(5, 16, 11, &TileRenderOverrides::default())
        .await
        .unwrap();
    assert_eq!(bytes.as_deref(), Some(png.as_slice()));

    // A different colour scheme is a different URL, which is not served.
    let overrides = TileRenderOverrides {
        color_scheme: Some(4),
        ..Default::default()
    };
    let missing = engine.fetch_oldest_past_tile(5, 16, 11, &overrides).await.unwrap();
    assert!(missing.is_none());
    assert!(http
        .requested_urls()
        .iter()
        .any(|u| u.ends_with("/5/16/11/4/1_1.png")));
}

#[tokio::test]
async fn test_passthrough_rejects_off_grid_tile() {
    let http = mock_with_catalog(&times::PAST, &times::NOWCAST);
    let out = engine(&http)
        .fetch_oldest_past_tile(2, 9, 0, &TileRenderOverrides::default())
        .await
        .unwrap();
    assert!(out.is_none());
    assert_eq!(http.call_count(), 0);
}
