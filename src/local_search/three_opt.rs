//! 3-opt local search over a single route's interior (§4.3).
//!
//! One pass: for each triple `(i, j, k)` the six non-trivial reconnections
//! of `A | B | C | D` are scored and the best-improving one is taken
//! immediately (first-improving across triples, best-of-six within a
//! triple) before moving on to the next triple.

use crate::distance::DistanceMatrix;
use crate::route::recompute_route_metrics;
use crate::types::{Route, Stop};

const IMPROVEMENT_TOLERANCE: f64 = 1e-9;

/// Run a single 3-opt sweep over `route`. Returns whether any move was
/// accepted, so callers (§4.4) can decide whether to re-run 2-opt.
pub fn three_opt_pass(route: &mut Route, matrix: &DistanceMatrix) -> bool {
    let len = route.stops.len();
    if len < 6 {
        return false;
    }

    let max_split = len - 2; // k must not exceed this
    let mut any_accepted = false;
    for i in 1..=max_split.saturating_sub(2) {
        for j in (i + 1)..=max_split.saturating_sub(1) {
            for k in (j + 1)..=max_split {
                if let Some(best) = best_reconnection(route, matrix, i, j, k) {
                    route.stops = best;
                    recompute_route_metrics(route, matrix);
                    any_accepted = true;
                }
            }
        }
    }
    any_accepted
}

fn segment_distance(matrix: &DistanceMatrix, stops: &[Stop]) -> f64 {
    stops
        .windows(2)
        .map(|w| matrix.get(&w[0].location_id, &w[1].location_id))
        .sum()
}

/// Build the 6 reconnection candidates for the `A|B|C|D` split at `(i, j,
/// k)` and return the full stop sequence of the best one, if it strictly
/// improves on the current route.
fn best_reconnection(
    route: &Route,
    matrix: &DistanceMatrix,
    i: usize,
    j: usize,
    k: usize,
) -> Option<Vec<Stop>> {
    let a = &route.stops[0..i];
    let b = &route.stops[i..j];
    let c = &route.stops[j..k];
    let d = &route.stops[k..];

    let rev = |seg: &[Stop]| -> Vec<Stop> { seg.iter().rev().cloned().collect() };

    let candidates: [Vec<Stop>; 6] = [
        concat(&[a, &rev(b), c, d]),       // reverse B
        concat(&[a, b, &rev(c), d]),       // reverse C
        concat(&[a, &rev(b), &rev(c), d]), // double-reverse
        concat(&[a, c, b, d]),             // swap B and C
        concat(&[a, &rev(c), b, d]),       // swap with C reversed
        concat(&[a, c, &rev(b), d]),       // swap with B reversed
    ];

    let current_len = segment_distance(matrix, &route.stops[i - 1..=k]);

    let mut best: Option<(f64, Vec<Stop>)> = None;
    for candidate in candidates {
        let candidate_len = segment_distance(matrix, &candidate[i - 1..=k]);
        let delta = candidate_len - current_len;
        if delta < -IMPROVEMENT_TOLERANCE {
            if best.as_ref().map(|(d, _)| delta < *d).unwrap_or(true) {
                best = Some((delta, candidate));
            }
        }
    }

    best.map(|(_, stops)| stops)
}

fn concat(segments: &[&[Stop]]) -> Vec<Stop> {
    let mut out = Vec::new();
    for seg in segments {
        out.extend_from_slice(seg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::renumber_stops;
    use crate::types::Location;

    #[test]
    fn three_opt_never_worsens_a_route() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let locs = [
            Location::new("A", "A", 0.0, 3.0, 1),
            Location::new("B", "B", 0.0, 1.0, 1),
            Location::new("C", "C", 0.0, 4.0, 1),
            Location::new("E", "E", 0.0, 2.0, 1),
        ];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), locs[0].coordinate()),
            ("B".into(), locs[1].coordinate()),
            ("C".into(), locs[2].coordinate()),
            ("E".into(), locs[3].coordinate()),
        ]);

        let mut route = Route::new_empty(&depot);
        for (idx, loc) in locs.iter().enumerate() {
            route.stops.insert(1 + idx, Stop::from_location(loc, 0));
        }
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, &matrix);
        let before = route.distance_km;

        three_opt_pass(&mut route, &matrix);
        assert!(route.distance_km <= before + 1e-9);
    }
}
