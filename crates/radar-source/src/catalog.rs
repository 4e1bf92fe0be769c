//! Radar frame catalog client.
//!
//! The catalog is a small JSON document naming the tile host and two
//! time-ordered frame lists: past observations and nowcast frames. It is
//! fetched once per request and never cached.

use std::sync::Arc;
use std::time::Duration;

use radar_common::{Catalog, EngineConfig, Frame, RadarError, RadarResult, Stage};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::http::HttpFetch;

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    host: Option<String>,
    #[serde(default)]
    generated: Option<i64>,
    radar: Option<RadarSection>,
}

#[derive(Debug, Deserialize)]
struct RadarSection {
    #[serde(default)]
    past: Vec<WireFrame>,
    #[serde(default)]
    nowcast: Vec<WireFrame>,
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    time: i64,
    path: String,
}

impl From<WireFrame> for Frame {
    fn from(f: WireFrame) -> Self {
        Frame::new(f.time, f.path)
    }
}

/// Parse a catalog document.
///
/// A missing `host` or `radar` section is a parse error; a missing `past` or
/// `nowcast` list inside `radar` is read as empty. Frames are sorted by time.
pub fn parse_catalog(body: &[u8]) -> RadarResult<Catalog> {
    let doc: CatalogDocument = serde_json::from_slice(body)?;

    let tile_host = doc
        .host
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| RadarError::parse(Stage::Catalog, "catalog has no tile host"))?;

    let radar = doc
        .radar
        .ok_or_else(|| RadarError::parse(Stage::Catalog, "catalog has no radar section"))?;

    let mut past_frames: Vec<Frame> = radar.past.into_iter().map(Frame::from).collect();
    let mut forecast_frames: Vec<Frame> = radar.nowcast.into_iter().map(Frame::from).collect();
    past_frames.sort_by_key(|f| f.timestamp);
    forecast_frames.sort_by_key(|f| f.timestamp);

    Ok(Catalog {
        tile_host,
        past_frames,
        forecast_frames,
        generated: doc.generated,
    })
}

/// Fetches the frame catalog. No retries; one request per call.
#[derive(Clone)]
pub struct CatalogClient {
    http: Arc<dyn HttpFetch>,
    url: String,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(http: Arc<dyn HttpFetch>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(http: Arc<dyn HttpFetch>, config: &EngineConfig) -> Self {
        Self::new(http, config.catalog_url.clone(), config.catalog_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the catalog.
    ///
    /// Transport failures (the request timeout included) and non-200
    /// statuses are `Network` errors; a body that is not a usable catalog is
    /// a `Parse` error.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> RadarResult<Catalog> {
        let response = self
            .http
            .get(&self.url, self.timeout)
            .await
            .map_err(|e| RadarError::network(Stage::Catalog, e.to_string()))?;

        if !response.is_ok() {
            return Err(RadarError::network(
                Stage::Catalog,
                format!("catalog request returned HTTP {}", response.status),
            ));
        }

        debug!(bytes = response.body.len(), "Catalog downloaded");
        let catalog = parse_catalog(&response.body)?;

        info!(
            host = %catalog.tile_host,
            past = catalog.past_frames.len(),
            nowcast = catalog.forecast_frames.len(),
            "Fetched radar catalog"
        );

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_catalog() {
        let body = br#"{
            "version": "2.0",
            "generated": 1700000700,
            "host": "https://tilecache.rainviewer.com",
            "radar": {
                "past": [
                    {"time": 1700000000, "path": "/v2/radar/1700000000"},
                    {"time": 1700000600, "path": "/v2/radar/1700000600"}
                ],
                "nowcast": [
                    {"time": 1700001200, "path": "/v2/radar/nowcast_1"}
                ]
            },
            "satellite": {"infrared": []}
        }"#;

        let catalog = parse_catalog(body).unwrap();
        assert_eq!(catalog.tile_host, "https://tilecache.rainviewer.com");
        assert_eq!(catalog.generated, Some(1700000700));
        assert_eq!(catalog.past_frames.len(), 2);
        assert_eq!(catalog.past_frames[1].path, "/v2/radar/1700000600");
        assert_eq!(catalog.forecast_frames[0].timestamp, 1700001200);
    }

    #[test]
    fn test_missing_nowcast_is_empty() {
        let body = br#"{"host": "h", "radar": {"past": [{"time": 1, "path": "/a"}]}}"#;
        let catalog = parse_catalog(body).unwrap();
        assert!(catalog.forecast_frames.is_empty());
        assert_eq!(catalog.past_frames.len(), 1);
    }

    #[test]
    fn test_frames_sorted_by_time() {
        let body = br#"{"host": "h", "radar": {"past": [
            {"time": 30, "path": "/c"}, {"time": 10, "path": "/a"}, {"time": 20, "path": "/b"}
        ]}}"#;
        let catalog = parse_catalog(body).unwrap();
        let times: Vec<i64> = catalog.past_frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(times, vec![10, 20, 30]);
    }

    #[test]
    fn test_missing_host_is_parse_error() {
        let body = br#"{"radar": {"past": []}}"#;
        let err = parse_catalog(body).unwrap_err();
        assert!(matches!(err, RadarError::Parse { stage: Stage::Catalog, .. }));
    }

    #[test]
    fn test_missing_radar_is_parse_error() {
        let body = br#"{"host": "https://tilecache.rainviewer.com"}"#;
        let err = parse_catalog(body).unwrap_err();
        assert!(err.to_string().contains("radar"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_catalog(b"<html>").unwrap_err();
        assert!(matches!(err, RadarError::Parse { .. }));
    }
}
