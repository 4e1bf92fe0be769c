//! Catalog client and tile fetcher against the in-memory HTTP backend.

use std::sync::Arc;
use std::time::Duration;

use radar_common::{RadarError, Stage, TileAddress};
use radar_source::{CatalogClient, FetchError, HttpFetch, TileError, TileFetcher};
use test_utils::{catalog_json, opaque_tile_png, rect_tile_png, times, MockHttp, CATALOG_URL, TILE_HOST};

const TIMEOUT: Duration = Duration::from_secs(5);

fn client(http: &Arc<MockHttp>) -> CatalogClient {
    let dyn_http: Arc<dyn HttpFetch> = http.clone();
    CatalogClient::new(dyn_http, CATALOG_URL, TIMEOUT)
}

fn fetcher(http: &Arc<MockHttp>, concurrency: usize) -> TileFetcher {
    let dyn_http: Arc<dyn HttpFetch> = http.clone();
    TileFetcher::new(dyn_http, TIMEOUT, concurrency)
}

fn url(n: u32) -> String {
    format!("{}/tile/{}.png", TILE_HOST, n)
}

// ============================================================================
// Catalog client
// ============================================================================

#[tokio::test]
async fn test_catalog_fetch_parses_frames() {
    let http = Arc::new(MockHttp::new());
    http.serve(CATALOG_URL, catalog_json(&times::PAST, &times::NOWCAST));

    let catalog = client(&http).fetch().await.unwrap();
    assert_eq!(catalog.tile_host, TILE_HOST);
    assert_eq!(catalog.past_frames.len(), 4);
    assert_eq!(catalog.forecast_frames.len(), 2);
    assert_eq!(catalog.latest_past().map(|f| f.timestamp), Some(times::PAST[3]));
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn test_catalog_is_fetched_every_call() {
    let http = Arc::new(MockHttp::new());
    http.serve(CATALOG_URL, catalog_json(&times::PAST, &[]));

    let client = client(&http);
    client.fetch().await.unwrap();
    client.fetch().await.unwrap();
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn test_catalog_transport_failure_is_network_error() {
    let http = Arc::new(MockHttp::new());
    http.fail(CATALOG_URL, FetchError::Connect("connection refused".into()));

    let err = client(&http).fetch().await.unwrap_err();
    assert!(matches!(err, RadarError::Network { stage: Stage::Catalog, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_catalog_non_200_is_network_error() {
    let http = Arc::new(MockHttp::new());
    let err = client(&http).fetch().await.unwrap_err();
    assert!(matches!(err, RadarError::Network { stage: Stage::Catalog, .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_catalog_without_radar_is_parse_error() {
    let http = Arc::new(MockHttp::new());
    http.serve(CATALOG_URL, r#"{"host": "https://tiles.test", "satellite": {}}"#);

    let err = client(&http).fetch().await.unwrap_err();
    assert!(matches!(err, RadarError::Parse { stage: Stage::Catalog, .. }));
}

// ============================================================================
// Tile fetcher
// ============================================================================

#[tokio::test]
async fn test_fetch_tile_decodes_alpha() {
    let http = Arc::new(MockHttp::new());
    http.serve(url(1), rect_tile_png(0, 0, 16, 8));

    let tile = fetcher(&http, 4).fetch_tile(&url(1)).await.unwrap();
    assert_eq!((tile.width, tile.height), (256, 256));
    assert_eq!(tile.wet_pixels(), 16 * 8);
}

#[tokio::test]
async fn test_fetch_tile_failures_are_none() {
    let http = Arc::new(MockHttp::new());
    http.serve_status(url(1), 500, "oops");
    http.serve(url(2), "not a png");
    http.fail(url(3), FetchError::Timeout);

    let fetcher = fetcher(&http, 4);
    assert!(fetcher.fetch_tile(&url(1)).await.is_none());
    assert!(fetcher.fetch_tile(&url(2)).await.is_none());
    assert!(fetcher.fetch_tile(&url(3)).await.is_none());
    assert!(fetcher.fetch_tile(&url(4)).await.is_none());
}

#[tokio::test]
async fn test_fetch_tile_bytes_reports_status() {
    let http = Arc::new(MockHttp::new());
    http.serve_status(url(1), 204, "");

    let err = fetcher(&http, 1).fetch_tile_bytes(&url(1)).await.unwrap_err();
    assert_eq!(err, TileError::Status(204));
}

#[tokio::test]
async fn test_batch_survives_partial_failure() {
    let http = Arc::new(MockHttp::new());
    for n in [0, 2, 4] {
        http.serve(url(n), opaque_tile_png());
    }

    let requests: Vec<(TileAddress, String)> = (0..6u32).map(|n| (TileAddress::new(3, n, 0), url(n))).collect();
    let batch = fetcher(&http, 3).fetch_all(requests).await;

    assert_eq!(batch.requested, 6);
    assert_eq!(batch.failed, 3);
    let xs: Vec<u32> = batch.tiles.iter().map(|(t, _)| t.x).collect();
    assert_eq!(xs, vec![0, 2, 4]);
    assert_eq!(http.call_count(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_batch_is_bounded_by_concurrency() {
    let http = Arc::new(MockHttp::new());
    http.serve_prefix_delayed(TILE_HOST, opaque_tile_png(), Duration::from_secs(1));

    let requests: Vec<(TileAddress, String)> = (0..8u32).map(|n| (TileAddress::new(3, n, 0), url(n))).collect();
    let started = tokio::time::Instant::now();
    let batch = fetcher(&http, 2).fetch_all(requests).await;

    assert_eq!(batch.tiles.len(), 8);
    // Eight one-second requests, two at a time.
    assert!(started.elapsed() >= Duration::from_secs(4));
}
