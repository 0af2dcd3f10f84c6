//! Or-opt local search over a single route's interior (§4.3).
//!
//! For segment lengths 1, 2, 3, lift the segment and reinsert it at every
//! other interior position; accept the first improvement. Used only inside
//! the enhanced local-search kernel (§4.5); basic Clarke-Wright does not
//! call this.

use crate::distance::DistanceMatrix;
use crate::route::recompute_route_metrics;
use crate::types::Route;

const IMPROVEMENT_TOLERANCE: f64 = 1e-9;
const SEGMENT_LENGTHS: [usize; 3] = [1, 2, 3];

/// Run Or-opt sweeps for segment lengths 1..=3 until a full pass over all
/// lengths makes no further improvement.
pub fn or_opt(route: &mut Route, matrix: &DistanceMatrix) {
    loop {
        let mut improved = false;
        for &seg_len in &SEGMENT_LENGTHS {
            if or_opt_sweep(route, matrix, seg_len) {
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }
}

fn or_opt_sweep(route: &mut Route, matrix: &DistanceMatrix, seg_len: usize) -> bool {
    let mut improved = false;
    let mut restart = true;
    while restart {
        restart = false;
        let len = route.stops.len();
        // Interior indices run 1..=len-2; the segment [i, i+seg_len) must
        // stay within the interior.
        if len < seg_len + 2 {
            break;
        }
        let last_start = len - 1 - seg_len; // inclusive
        let mut i = 1;
        while i <= last_start {
            if try_relocate(route, matrix, i, seg_len) {
                improved = true;
                restart = true;
                break;
            }
            i += 1;
        }
    }
    improved
}

/// Try lifting `stops[i..i+seg_len]` and reinserting it at every other
/// interior gap; accept the first improving reinsertion.
fn try_relocate(route: &mut Route, matrix: &DistanceMatrix, i: usize, seg_len: usize) -> bool {
    let len = route.stops.len();
    let segment: Vec<_> = route.stops[i..i + seg_len].to_vec();

    let before = &route.stops[i - 1];
    let after = &route.stops[i + seg_len];
    let removal_gain = matrix.get(&before.location_id, &segment[0].location_id)
        + matrix.get(&segment[seg_len - 1].location_id, &after.location_id)
        - matrix.get(&before.location_id, &after.location_id);

    let mut without_segment = route.stops.clone();
    without_segment.drain(i..i + seg_len);

    // Candidate insertion gaps in the reduced sequence, excluding the gap we
    // just vacated (reinserting in place is a no-op).
    for j in 1..without_segment.len() {
        if j == i {
            continue;
        }
        let left = &without_segment[j - 1];
        let right = &without_segment[j];
        let insertion_cost = matrix.get(&left.location_id, &segment[0].location_id)
            + matrix.get(&segment[seg_len - 1].location_id, &right.location_id)
            - matrix.get(&left.location_id, &right.location_id);

        if insertion_cost - removal_gain < -IMPROVEMENT_TOLERANCE {
            let mut new_stops = without_segment[..j].to_vec();
            new_stops.extend(segment.iter().cloned());
            new_stops.extend_from_slice(&without_segment[j..]);
            debug_assert_eq!(new_stops.len(), len);
            route.stops = new_stops;
            crate::route::renumber_stops(route);
            recompute_route_metrics(route, matrix);
            return true;
        }
    }
    false
}
