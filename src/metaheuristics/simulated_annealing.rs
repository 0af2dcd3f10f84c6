//! Simulated Annealing (§4.9), seeded with Enhanced Clarke-Wright.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::constructors::clarke_wright;
use crate::distance::DistanceMatrix;
use crate::metaheuristics::{clamp_usize, total_distance};
use crate::route::recompute_route_metrics;
use crate::types::{Location, Route, VehicleType};

const INITIAL_TEMPERATURE: f64 = 1000.0;
const COOLING_RATE: f64 = 0.95;
const MIN_TEMPERATURE: f64 = 1.0;

pub fn solve(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
    seed: Option<u64>,
    cancellation: Option<&CancellationToken>,
) -> Vec<Route> {
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let n = locations.iter().filter(|l| !l.is_depot).count();
    let inner_iterations = clamp_usize(5 * n as i64, 50, 200);

    let mut current = clarke_wright::solve_enhanced(locations, vehicles, depot, matrix);
    let mut current_cost = total_distance(&current);
    let mut best = current.clone();
    let mut best_cost = current_cost;

    let mut temperature = INITIAL_TEMPERATURE;
    while temperature > MIN_TEMPERATURE {
        if cancellation.is_some_and(|c| c.is_cancelled()) {
            debug!(temperature, "simulated annealing cancelled");
            break;
        }
        for _ in 0..inner_iterations {
            let Some((route_idx, i, j)) = pick_swap_indices(&current, &mut rng) else {
                continue;
            };

            let before = current[route_idx].distance_km;
            current[route_idx].stops.swap(i, j);
            recompute_route_metrics(&mut current[route_idx], matrix);
            let after = current[route_idx].distance_km;
            let delta = after - before;

            let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();
            if accept {
                current_cost += delta;
                if current_cost < best_cost {
                    best_cost = current_cost;
                    best = current.clone();
                }
            } else {
                current[route_idx].stops.swap(i, j);
                recompute_route_metrics(&mut current[route_idx], matrix);
            }
        }
        temperature *= COOLING_RATE;
    }

    debug!(best_cost, "simulated annealing finished");
    best
}

/// Pick a random route with at least two interior stops, and two distinct
/// uniformly chosen interior stop indices to swap (§4.9).
fn pick_swap_indices(routes: &[Route], rng: &mut impl Rng) -> Option<(usize, usize, usize)> {
    let candidates: Vec<usize> = routes.iter().enumerate().filter(|(_, r)| r.interior_len() >= 2).map(|(i, _)| i).collect();
    if candidates.is_empty() {
        return None;
    }
    let route_idx = candidates[rng.gen_range(0..candidates.len())];
    let interior_len = routes[route_idx].interior_len();

    let a = 1 + rng.gen_range(0..interior_len);
    let b = 1 + rng.gen_range(0..interior_len);
    if a == b {
        None
    } else {
        Some((route_idx, a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_reproducible_with_the_same_seed() {
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

        let first = solve(&locations, &vehicles, &depot, &matrix, Some(42), None);
        let second = solve(&locations, &vehicles, &depot, &matrix, Some(42), None);
        assert_eq!(total_distance(&first), total_distance(&second));
    }

    #[test]
    fn never_produces_a_worse_solution_than_the_seed() {
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

        let seed_cost = total_distance(&clarke_wright::solve_enhanced(&locations, &vehicles, &depot, &matrix));
        let result = solve(&locations, &vehicles, &depot, &matrix, Some(7), None);
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

        let token = CancellationToken::new();
        token.cancel();
        let seed_cost = total_distance(&clarke_wright::solve_enhanced(&locations, &vehicles, &depot, &matrix));
        let result = solve(&locations, &vehicles, &depot, &matrix, Some(7), Some(&token));
        assert_eq!(total_distance(&result), seed_cost);
    }
}
