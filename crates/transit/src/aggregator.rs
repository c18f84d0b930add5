//! Merging, filtering and ordering of per-batch parse results.
//!
//! The upstream feed accepts at most [`MAX_STATIONS_PER_REQUEST`] station
//! ids per call, so a favorites fetch is split into chunks, parsed per
//! chunk, and unioned here.

use std::cmp::Ordering;

use crate::identifiers::StationId;
use crate::models::arrivals::{Eta, TrainArrivalMap};
use crate::network::traits::PreferenceStore;

/// Per-call station-id cap observed on the arrivals endpoint.
pub const MAX_STATIONS_PER_REQUEST: usize = 4;

/// Split a favorite-id list into request-sized chunks.
///
/// `slice::chunks` yields a disjoint partition, which is what makes the
/// merge below commutative over any completion order.
pub fn chunk_station_ids(ids: &[StationId]) -> std::slice::Chunks<'_, StationId> {
    ids.chunks(MAX_STATIONS_PER_REQUEST)
}

/// Union per-chunk results by station id.
///
/// Chunks are built as a disjoint partition, so a key collision can only
/// come from caller-constructed overlap (a request-building bug, not merge
/// ambiguity); last write wins in that case.
pub fn merge_batches(batches: impl IntoIterator<Item = TrainArrivalMap>) -> TrainArrivalMap {
    let mut merged = TrainArrivalMap::new();
    for batch in batches {
        merged.extend(batch);
    }
    merged
}

/// Drop Etas the user has hidden for their (station, line, direction).
///
/// Only the Eta lists are rewritten; station/stop/line objects are never
/// touched. An Eta whose stop was not resolved has no direction to test
/// and is retained.
pub fn apply_visibility(arrivals: &mut TrainArrivalMap, preferences: &dyn PreferenceStore) {
    for arrival in arrivals.values_mut() {
        arrival.etas.retain(|eta| match eta.stop_direction {
            Some(direction) => preferences.is_visible(eta.station_id, eta.line, direction),
            None => true,
        });
    }
}

/// Order every station's Eta list for display.
pub fn sort_for_display(arrivals: &mut TrainArrivalMap) {
    for arrival in arrivals.values_mut() {
        arrival.etas.sort_by(compare_etas);
    }
}

/// Display order: ascending arrival time (unset times last), ties broken by
/// line declaration order, then run number. Total and deterministic — this
/// feeds directly into UI row order.
pub fn compare_etas(a: &Eta, b: &Eta) -> Ordering {
    let by_time = match (a.arrival_at, b.arrival_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time
        .then_with(|| a.line.cmp(&b.line))
        .then_with(|| a.run_number.cmp(&b.run_number))
}
