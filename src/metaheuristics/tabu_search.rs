//! Tabu Search (§4.8), seeded with Enhanced Clarke-Wright.

use std::collections::HashMap;

use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::constructors::clarke_wright;
use crate::distance::DistanceMatrix;
use crate::metaheuristics::{clamp_usize, solution_key, total_distance};
use crate::route::recompute_route_metrics;
use crate::types::{Location, Route, VehicleType};

const MAX_NEIGHBORS: usize = 50;

pub fn solve(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
    cancellation: Option<&CancellationToken>,
) -> Vec<Route> {
    let n = locations.iter().filter(|l| !l.is_depot).count();
    let tenure = clamp_usize(n as i64 / 2, 5, 15);
    let iterations = clamp_usize(3 * n as i64, 20, 100);

    let mut current = clarke_wright::solve_enhanced(locations, vehicles, depot, matrix);
    let mut best = current.clone();
    let mut best_cost = total_distance(&best);

    let mut tabu: HashMap<String, usize> = HashMap::new();

    for iteration in 0..iterations {
        if cancellation.is_some_and(|c| c.is_cancelled()) {
            debug!(iteration, "tabu search cancelled");
            break;
        }
        tabu.retain(|_, expiry| *expiry > iteration);

        let neighbors = generate_neighbors(&current, matrix);
        let mut chosen: Option<Vec<Route>> = None;
        let mut chosen_cost = f64::INFINITY;

        for candidate in &neighbors {
            let key = solution_key(candidate);
            if tabu.contains_key(&key) {
                continue;
            }
            let cost = total_distance(candidate);
            if cost < chosen_cost {
                chosen_cost = cost;
                chosen = Some(candidate.clone());
            }
        }

        let Some(next) = chosen else {
            debug!(iteration, "tabu search found no non-tabu neighbor, terminating early");
            break;
        };

        current = next;
        tabu.insert(solution_key(&current), iteration + tenure);

        if chosen_cost < best_cost {
            best_cost = chosen_cost;
            best = current.clone();
        }
    }

    best
}

/// All intra-route pairwise swaps across every route, up to
/// [`MAX_NEIGHBORS`], in deterministic generation order: route index, then
/// `(i, j)` interior-index pairs.
fn generate_neighbors(routes: &[Route], matrix: &DistanceMatrix) -> Vec<Vec<Route>> {
    let mut neighbors = Vec::new();

    'outer: for (route_idx, route) in routes.iter().enumerate() {
        let interior_len = route.interior_len();
        for i in 0..interior_len {
            for j in (i + 1)..interior_len {
                let mut candidate = routes.to_vec();
                candidate[route_idx].stops.swap(i + 1, j + 1);
                recompute_route_metrics(&mut candidate[route_idx], matrix);
                neighbors.push(candidate);
                if neighbors.len() >= MAX_NEIGHBORS {
                    break 'outer;
                }
            }
        }
    }

    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_produces_a_worse_solution_than_the_seed() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 3);
        let b = Location::new("B", "B", 0.0, 2.0, 3);
        let c = Location::new("C", "C", 0.1, 1.5, 2);
        let locations = vec![depot.clone(), a.clone(), b.clone(), c.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 2)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
            ("C".into(), c.coordinate()),
        ]);

        let seed = clarke_wright::solve_enhanced(&locations, &vehicles, &depot, &matrix);
        let seed_cost = total_distance(&seed);

        let result = solve(&locations, &vehicles, &depot, &matrix, None);
        assert!(total_distance(&result) <= seed_cost + 1e-9);
    }

    #[test]
    fn stops_immediately_when_pre_cancelled() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 3);
        let b = Location::new("B", "B", 0.0, 2.0, 3);
        let locations = vec![depot.clone(), a.clone(), b.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 2)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
        ]);

        let token = crate::cancellation::CancellationToken::new();
        token.cancel();
        let seed_cost = total_distance(&clarke_wright::solve_enhanced(&locations, &vehicles, &depot, &matrix));
        let result = solve(&locations, &vehicles, &depot, &matrix, Some(&token));
        assert_eq!(total_distance(&result), seed_cost);
    }
}
