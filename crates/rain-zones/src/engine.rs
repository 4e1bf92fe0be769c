//! The extraction pipeline.
//!
//! catalog -> frame selection -> grid plan -> tile download -> mask ->
//! contour trace -> simplify -> project. The catalog is fetched fresh for
//! every call. Tile failures only thin out the mask; a catalog failure or an
//! expired deadline fails the call.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use radar_common::{
    AlphaTile, BoundingBox, Catalog, EngineConfig, FrameSelection, GeoPoint, PixelProjector,
    RadarError, RadarResult, Stage, TileAddress, TileRange,
};
use radar_source::{
    tile_url, CatalogClient, HttpFetch, ReqwestFetch, TileFetcher, TileRenderOverrides,
    TileRenderParams,
};
use rain_vector::{trace, Mask, Simplifier};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::planner::plan;
use crate::polygon::{ExtractionRequest, ExtractionResult, Polygon};
use crate::selector::select;

/// Margin around a route used for corridor queries.
pub const DEFAULT_CORRIDOR_MARGIN_KM: f64 = 30.0;

/// Radar polygon extraction engine.
///
/// Cheap to clone; clones share the HTTP client.
#[derive(Clone)]
pub struct RainZoneEngine {
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) catalog: CatalogClient,
    pub(crate) fetcher: TileFetcher,
    pub(crate) render: TileRenderParams,
    clock: fn() -> i64,
}

fn system_now() -> i64 {
    Utc::now().timestamp()
}

impl RainZoneEngine {
    pub fn new(http: Arc<dyn HttpFetch>, config: EngineConfig) -> Self {
        Self {
            catalog: CatalogClient::from_config(http.clone(), &config),
            fetcher: TileFetcher::from_config(http, &config),
            render: TileRenderParams::from(&config),
            config: Arc::new(config),
            clock: system_now,
        }
    }

    /// Engine backed by a real HTTP client.
    pub fn with_reqwest(config: EngineConfig) -> RadarResult<Self> {
        let http = ReqwestFetch::new().map_err(|e| RadarError::network(Stage::Catalog, e.to_string()))?;
        Ok(Self::new(Arc::new(http), config))
    }

    /// Replace the clock used by the "now"-relative selection policies.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Extract rain polygons for one frame.
    #[instrument(
        skip(self, request),
        fields(
            mode = %request.selection.mode(),
            simplify = request.simplify,
            north = request.bbox.north,
            south = request.bbox.south,
            east = request.bbox.east,
            west = request.bbox.west,
        )
    )]
    pub async fn extract(&self, request: &ExtractionRequest) -> RadarResult<ExtractionResult> {
        within(request.deadline, async {
            let catalog = self.catalog.fetch().await?;
            self.extract_frame(&catalog, &request.bbox, &request.selection, request.simplify)
                .await
        })
        .await
    }

    /// Polygon list only, for callers that do not need the frame metadata.
    pub async fn fetch_polygons(
        &self,
        bbox: BoundingBox,
        selection: FrameSelection,
        simplify: bool,
    ) -> RadarResult<Vec<Polygon>> {
        let request = ExtractionRequest::new(bbox, selection).simplified(simplify);
        Ok(self.extract(&request).await?.polygons)
    }

    /// Simplified rain zones in the box spanned by two route endpoints,
    /// widened by `margin_km`.
    pub async fn corridor(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        margin_km: f64,
        selection: FrameSelection,
    ) -> RadarResult<ExtractionResult> {
        let bbox = BoundingBox::around_route(start, end, margin_km);
        self.extract(&ExtractionRequest::new(bbox, selection).simplified(true))
            .await
    }

    /// Simplified rain zones around every point of a route polyline.
    /// An empty route yields an empty result without any request.
    pub async fn along_route(
        &self,
        route: &[GeoPoint],
        margin_km: f64,
        selection: FrameSelection,
    ) -> RadarResult<ExtractionResult> {
        let Some(bbox) = BoundingBox::enclosing(route, margin_km) else {
            return Ok(ExtractionResult::empty(selection.mode()));
        };
        self.extract(&ExtractionRequest::new(bbox, selection).simplified(true))
            .await
    }

    /// Raw bytes of one tile of the oldest past frame; `None` when the tile
    /// is off the grid, the catalog has no past frame, or the download fails.
    #[instrument(skip(self, overrides))]
    pub async fn fetch_oldest_past_tile(
        &self,
        zoom: u32,
        x: u32,
        y: u32,
        overrides: &TileRenderOverrides,
    ) -> RadarResult<Option<Bytes>> {
        let tile = TileAddress::new(zoom, x, y);
        if !tile.is_valid() {
            return Ok(None);
        }

        let catalog = self.catalog.fetch().await?;
        let Some(frame) = catalog.oldest_past() else {
            return Ok(None);
        };

        let params = self.render.with_overrides(overrides);
        let url = tile_url(&catalog.tile_host, frame, &tile, &params);
        match self.fetcher.fetch_tile_bytes(&url).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                debug!(url = %url, error = %e, "Passthrough tile unavailable");
                Ok(None)
            }
        }
    }

    /// Run the pipeline for one selection against an already fetched catalog.
    pub(crate) async fn extract_frame(
        &self,
        catalog: &Catalog,
        bbox: &BoundingBox,
        selection: &FrameSelection,
        simplify: bool,
    ) -> RadarResult<ExtractionResult> {
        if catalog.past_frames.is_empty() {
            return Err(RadarError::NoData("catalog lists no past frames".into()));
        }

        let mode = selection.mode();
        let Some(frame) = select(catalog, selection, self.now()) else {
            info!(mode = %mode, "No frame matches selection");
            return Err(RadarError::NoData(format!("no frame matches {}", mode)));
        };

        let started = Instant::now();
        let range = plan(bbox, &self.config);
        let requests: Vec<(TileAddress, String)> = range
            .tiles()
            .map(|tile| {
                let url = tile_url(&catalog.tile_host, frame, &tile, &self.render);
                (tile, url)
            })
            .collect();

        let batch = self.fetcher.fetch_all(requests).await;
        let fetched = batch.tiles.len();

        let tile_size = self.render.tile_size;
        let simplifier = Simplifier::new(self.config.simplify_tolerance_deg, simplify);
        let polygons = tokio::task::spawn_blocking(move || {
            vectorize(&range, tile_size, &batch.tiles, &simplifier)
        })
        .await
        .map_err(|e| RadarError::Internal {
            stage: Stage::Extraction,
            message: format!("vectorization task failed: {}", e),
        })?;

        info!(
            frame = frame.timestamp,
            zoom = range.zoom,
            tiles = range.tile_count(),
            fetched,
            polygons = polygons.len(),
            vertices = polygons.iter().map(Polygon::len).sum::<usize>(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction complete"
        );

        Ok(ExtractionResult {
            polygons,
            frame_timestamp: frame.timestamp,
            selection_policy: mode,
        })
    }
}

/// Stitch, trace, simplify and project. CPU-bound; rings are simplified in
/// parallel and keep their trace order.
pub fn vectorize(
    range: &TileRange,
    tile_size: u32,
    tiles: &[(TileAddress, AlphaTile)],
    simplifier: &Simplifier,
) -> Vec<Polygon> {
    let mask = Mask::build(range, tile_size, tiles);
    if mask.is_clear() {
        return Vec::new();
    }

    let rings = trace(&mask);
    let projector = PixelProjector::new(range.zoom, tile_size, range.x_min, range.y_min);
    let polygons: Vec<Polygon> = rings
        .par_iter()
        .filter_map(|ring| simplifier.apply(ring, &projector))
        .map(|ring| Polygon::from_ring(&ring, &projector))
        .collect();

    debug!(rings = rings.len(), polygons = polygons.len(), "Rings vectorized");
    polygons
}

/// Bound `work` by `deadline`, reporting expiry as an extraction timeout.
pub(crate) async fn within<T, F>(deadline: Option<Duration>, work: F) -> RadarResult<T>
where
    F: Future<Output = RadarResult<T>>,
{
    match deadline {
        Some(after) => tokio::time::timeout(after, work)
            .await
            .map_err(|_| RadarError::Timeout {
                stage: Stage::Extraction,
                after,
            })?,
        None => work.await,
    }
}
