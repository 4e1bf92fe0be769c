//! Tile download and decoding.
//!
//! Individual tile failures never abort a batch: a tile that times out,
//! returns a non-200 status, or does not decode is reported as absent and the
//! caller treats its area as dry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use radar_common::{AlphaTile, EngineConfig, TileAddress};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::http::{FetchError, HttpFetch};

/// Why a single tile could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("transport: {0}")]
    Transport(#[from] FetchError),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(String),
}

/// Decode PNG (or any enabled image format) bytes and keep the alpha channel.
pub fn decode_alpha(bytes: &[u8]) -> Result<AlphaTile, TileError> {
    let img = image::load_from_memory(bytes).map_err(|e| TileError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let alpha = rgba.pixels().map(|p| p.0[3]).collect();
    Ok(AlphaTile::new(width, height, alpha))
}

/// Outcome of a batch download: the decoded tiles plus failure bookkeeping.
#[derive(Debug, Default)]
pub struct TileBatch {
    pub tiles: Vec<(TileAddress, AlphaTile)>,
    pub requested: usize,
    pub failed: usize,
}

/// Downloads tiles with a per-request timeout and bounded parallelism.
#[derive(Clone)]
pub struct TileFetcher {
    http: Arc<dyn HttpFetch>,
    timeout: Duration,
    concurrency: usize,
}

impl TileFetcher {
    pub fn new(http: Arc<dyn HttpFetch>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            http,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(http: Arc<dyn HttpFetch>, config: &EngineConfig) -> Self {
        Self::new(http, config.tile_timeout, config.tile_concurrency)
    }

    /// Raw tile bytes; any failure is returned as a [`TileError`].
    pub async fn fetch_tile_bytes(&self, url: &str) -> Result<Bytes, TileError> {
        let response = self.http.get(url, self.timeout).await?;
        if !response.is_ok() {
            return Err(TileError::Status(response.status));
        }
        Ok(response.body)
    }

    /// Fetch and decode one tile; `None` on any failure.
    pub async fn fetch_tile(&self, url: &str) -> Option<AlphaTile> {
        match self.try_fetch_tile(url).await {
            Ok(tile) => Some(tile),
            Err(e) => {
                debug!(url = %url, error = %e, "Tile unavailable");
                None
            }
        }
    }

    async fn try_fetch_tile(&self, url: &str) -> Result<AlphaTile, TileError> {
        let bytes = self.fetch_tile_bytes(url).await?;
        decode_alpha(&bytes)
    }

    /// Fetch every `(tile, url)` pair and wait for all outcomes.
    ///
    /// At most `concurrency` requests are in flight at once. The returned
    /// batch holds only the tiles that downloaded and decoded.
    #[instrument(skip(self, requests), fields(tiles = requests.len()))]
    pub async fn fetch_all(&self, requests: Vec<(TileAddress, String)>) -> TileBatch {
        let started = Instant::now();
        let requested = requests.len();

        let outcomes: Vec<(TileAddress, Option<AlphaTile>)> = stream::iter(requests)
            .map(|(tile, url)| async move {
                let decoded = self.fetch_tile(&url).await;
                (tile, decoded)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut batch = TileBatch {
            requested,
            ..Default::default()
        };
        for (tile, decoded) in outcomes {
            match decoded {
                Some(t) => batch.tiles.push((tile, t)),
                None => batch.failed += 1,
            }
        }
        batch.tiles.sort_by_key(|(tile, _)| *tile);

        if batch.failed > 0 {
            warn!(
                failed = batch.failed,
                requested, "Some tiles unavailable; treating their area as dry"
            );
        }
        info!(
            fetched = batch.tiles.len(),
            failed = batch.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tile batch complete"
        );

        batch
    }
}
