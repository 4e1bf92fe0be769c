//! Frame selection: picks one catalog frame for a [`FrameSelection`].
//!
//! Pure lookups over an already fetched catalog. `now` is passed in so the
//! time-relative policies are deterministic under test.

use radar_common::{Catalog, Frame, FrameSelection};

/// Select the frame `selection` refers to.
///
/// Returns `None` when the past list is empty, when a forecast index is
/// requested from an empty forecast list, and never otherwise.
pub fn select<'a>(catalog: &'a Catalog, selection: &FrameSelection, now: i64) -> Option<&'a Frame> {
    let past = &catalog.past_frames;
    let forecast = &catalog.forecast_frames;
    if past.is_empty() {
        return None;
    }

    match *selection {
        FrameSelection::OldestPast => catalog.oldest_past(),
        FrameSelection::LatestPast => catalog.latest_past(),
        FrameSelection::NearestToNow => {
            let last_past = catalog.latest_past()?;
            let Some(first_future) = catalog.first_forecast() else {
                return Some(last_past);
            };
            let d_past = (now - last_past.timestamp).abs();
            let d_future = (first_future.timestamp - now).abs();
            if d_past <= d_future {
                Some(last_past)
            } else {
                Some(first_future)
            }
        }
        FrameSelection::PastIndex(index) => past.get(clamp_index(index, past.len())),
        FrameSelection::FutureIndex(index) => {
            if forecast.is_empty() {
                return None;
            }
            forecast.get(clamp_index(index, forecast.len()))
        }
        FrameSelection::ClosestToTimestamp(target) => {
            let target = target.unwrap_or(now);
            let mut best: Option<(&Frame, i64)> = None;
            for frame in past.iter().chain(forecast.iter()) {
                let d = (frame.timestamp - target).abs();
                // Strict comparison keeps the first frame on ties.
                if best.map_or(true, |(_, best_d)| d < best_d) {
                    best = Some((frame, d));
                }
            }
            best.map(|(frame, _)| frame)
        }
    }
}

fn clamp_index(index: i64, len: usize) -> usize {
    if index <= 0 {
        return 0;
    }
    (index as u64).min(len as u64 - 1) as usize
}
