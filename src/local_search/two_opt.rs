//! 2-opt local search over a single route's interior (§4.3).

use crate::distance::DistanceMatrix;
use crate::route::recompute_route_metrics;
use crate::types::Route;

const IMPROVEMENT_TOLERANCE: f64 = 1e-9;

/// Repeatedly reverse interior segments `stops[i..=k]` while doing so
/// strictly shortens the route, first-improvement, until a full sweep finds
/// nothing left to improve.
pub fn two_opt(route: &mut Route, matrix: &DistanceMatrix) {
    loop {
        if !two_opt_sweep(route, matrix) {
            break;
        }
    }
}

/// One first-improvement sweep over every `(i, k)` pair. Returns whether any
/// move was accepted.
fn two_opt_sweep(route: &mut Route, matrix: &DistanceMatrix) -> bool {
    let len = route.stops.len();
    if len < 4 {
        return false;
    }

    let mut improved = false;
    let mut i = 1;
    while i <= len.saturating_sub(3) {
        let mut k = i + 1;
        while k <= len - 2 {
            let delta = reversal_delta(route, matrix, i, k);
            if delta < -IMPROVEMENT_TOLERANCE {
                route.stops[i..=k].reverse();
                recompute_route_metrics(route, matrix);
                improved = true;
            }
            k += 1;
        }
        i += 1;
    }
    improved
}

/// Change in total distance if `stops[i..=k]` were reversed, without
/// mutating the route.
fn reversal_delta(route: &Route, matrix: &DistanceMatrix, i: usize, k: usize) -> f64 {
    let before_i = &route.stops[i - 1];
    let at_i = &route.stops[i];
    let at_k = &route.stops[k];
    let after_k = &route.stops[k + 1];

    let removed = matrix.get(&before_i.location_id, &at_i.location_id)
        + matrix.get(&at_k.location_id, &after_k.location_id);
    let added = matrix.get(&before_i.location_id, &at_k.location_id)
        + matrix.get(&at_i.location_id, &after_k.location_id);

    added - removed
}
