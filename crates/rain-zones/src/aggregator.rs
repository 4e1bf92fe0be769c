//! Every catalog frame for one bounding box, in time order.

use std::time::{Duration, Instant};

use radar_common::{BoundingBox, FrameSelection, RadarError, RadarResult};
use tracing::{info, instrument};

use crate::engine::{within, RainZoneEngine};
use crate::polygon::ExtractionResult;

impl RainZoneEngine {
    /// One extraction per past frame and per forecast frame, sorted by
    /// frame time. Polygons are left unsimplified.
    pub async fn extract_all(&self, bbox: &BoundingBox) -> RadarResult<Vec<ExtractionResult>> {
        self.extract_timeline(bbox, false, None).await
    }

    /// [`RainZoneEngine::extract_all`] with simplification and an optional
    /// deadline covering every frame.
    #[instrument(skip(self, bbox))]
    pub async fn extract_timeline(
        &self,
        bbox: &BoundingBox,
        simplify: bool,
        deadline: Option<Duration>,
    ) -> RadarResult<Vec<ExtractionResult>> {
        within(deadline, async {
            let started = Instant::now();
            let catalog = self.catalog.fetch().await?;
            if catalog.past_frames.is_empty() {
                return Err(RadarError::NoData("catalog lists no past frames".into()));
            }

            let selections = (0..catalog.past_frames.len())
                .map(|i| FrameSelection::PastIndex(i as i64))
                .chain((0..catalog.forecast_frames.len()).map(|i| FrameSelection::FutureIndex(i as i64)));

            let mut results = Vec::with_capacity(catalog.past_frames.len() + catalog.forecast_frames.len());
            for selection in selections {
                results.push(self.extract_frame(&catalog, bbox, &selection, simplify).await?);
            }
            results.sort_by_key(|r| r.frame_timestamp);

            info!(
                frames = results.len(),
                wet_frames = results.iter().filter(|r| !r.is_dry()).count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Timeline extracted"
            );
            Ok(results)
        })
        .await
    }
}
