//! Ant Colony (§4.11).
//!
//! Preserves a documented anomaly carried over from the original
//! implementation (§9): each ant's solution is a first-fit construction
//! blind to the pheromone table, and only the *first* route of that
//! construction is kept as the ant's "solution". Pheromone deposit and
//! evaporation still run every iteration; they just never feed back into
//! how an ant builds its route.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::distance::DistanceMatrix;
use crate::metaheuristics::{clamp_usize, random_first_fit_solution};
use crate::types::{Location, LocationId, Route, VehicleType};

const ALPHA: f64 = 1.0;
const BETA: f64 = 2.0;
const EVAPORATION: f64 = 0.1;
const DEPOSIT: f64 = 100.0;

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

    // ALPHA/BETA are tracked parameters of the scheme but, per the
    // construction rule above, never weight an ant's next-stop choice.
    let _ = (ALPHA, BETA);

    let n = locations.iter().filter(|l| !l.is_depot).count();
    let ants = clamp_usize(n as i64, 5, 20);
    let iterations = clamp_usize(2 * n as i64, 10, 50);

    let mut pheromone: HashMap<(LocationId, LocationId), f64> = HashMap::new();
    for a in locations {
        for b in locations {
            if a.id != b.id {
                pheromone.insert((a.id.clone(), b.id.clone()), 1.0);
            }
        }
    }

    let mut best: Option<Route> = None;
    let mut best_cost = f64::INFINITY;

    for iteration in 0..iterations {
        if cancellation.is_some_and(|c| c.is_cancelled()) {
            debug!(iteration, "ant colony cancelled");
            break;
        }
        let mut ant_routes = Vec::with_capacity(ants);
        for _ in 0..ants {
            let mut built = random_first_fit_solution(locations, vehicles, depot, matrix, &mut rng);
            if !built.is_empty() {
                ant_routes.push(built.swap_remove(0));
            }
        }

        for value in pheromone.values_mut() {
            *value *= 1.0 - EVAPORATION;
        }

        for route in &ant_routes {
            if route.is_empty_route() {
                continue;
            }
            let cost = route.distance_km.max(1e-9);
            let deposit = DEPOSIT / cost;
            for pair in route.stops.windows(2) {
                if let Some(value) = pheromone.get_mut(&(pair[0].location_id.clone(), pair[1].location_id.clone())) {
                    *value += deposit;
                }
            }
            if route.distance_km < best_cost {
                best_cost = route.distance_km;
                best = Some(route.clone());
            }
        }

        debug!(iteration, best_cost, "ant colony iteration complete");
    }

    best.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_at_most_one_route() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 3);
        let b = Location::new("B", "B", 0.0, 2.0, 3);
        let c = Location::new("C", "C", 0.1, 1.5, 2);
        let locations = vec![depot.clone(), a.clone(), b.clone(), c.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 3)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
            ("C".into(), c.coordinate()),
        ]);

        let routes = solve(&locations, &vehicles, &depot, &matrix, Some(3), None);
        assert!(routes.len() <= 1);
    }

    #[test]
    fn is_reproducible_with_the_same_seed() {
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

        let first = solve(&locations, &vehicles, &depot, &matrix, Some(5), None);
        let second = solve(&locations, &vehicles, &depot, &matrix, Some(5), None);
        let first_cost: f64 = first.iter().map(|r| r.distance_km).sum();
        let second_cost: f64 = second.iter().map(|r| r.distance_km).sum();
        assert_eq!(first_cost, second_cost);
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
        let routes = solve(&locations, &vehicles, &depot, &matrix, Some(5), Some(&token));
        assert!(routes.len() <= 1);
    }
}
