//! Metaheuristic solvers (§4.8-§4.11). Each seeds from Enhanced
//! Clarke-Wright or a random first-fit construction and consumes a PRNG the
//! caller may seed for reproducibility (§5).

pub mod ant_colony;
pub mod genetic;
pub mod simulated_annealing;
pub mod tabu_search;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::distance::DistanceMatrix;
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::slots::expand_slots;
use crate::types::{Location, Route, Stop, VehicleType};

/// `clamp(value, lo, hi)` over the iteration/population formulas in
/// §4.8-§4.11, all phrased as `clamp(f(n), lo, hi)`.
pub fn clamp_usize(value: i64, lo: usize, hi: usize) -> usize {
    value.clamp(lo as i64, hi as i64) as usize
}

pub fn total_distance(routes: &[Route]) -> f64 {
    routes.iter().map(|r| r.distance_km).sum()
}

/// The random-solution builder shared by the GA (§4.10) and each ant's
/// per-iteration construction (§4.11): shuffle the non-depot locations, then
/// place each into the first vehicle slot (in order) whose remaining
/// capacity admits it; locations that fit nowhere are dropped.
pub fn random_first_fit_solution(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
    rng: &mut ChaCha8Rng,
) -> Vec<Route> {
    let slots = expand_slots(vehicles);
    if slots.is_empty() {
        return Vec::new();
    }

    let mut shuffled: Vec<&Location> = locations.iter().filter(|l| !l.is_depot).collect();
    shuffled.shuffle(rng);

    let mut remaining: Vec<u32> = slots.iter().map(|s| s.capacity).collect();
    let mut bucket: Vec<Vec<&Location>> = vec![Vec::new(); slots.len()];

    for location in shuffled {
        let demand = location.effective_demand();
        if let Some(slot_idx) = remaining.iter().position(|&cap| cap >= demand) {
            remaining[slot_idx] -= demand;
            bucket[slot_idx].push(location);
        }
    }

    let mut routes = Vec::new();
    for stops in bucket {
        if stops.is_empty() {
            continue;
        }
        let mut route = Route::new_empty(depot);
        for location in stops {
            let order = route.stops.len() - 1;
            route.stops.insert(order, Stop::from_location(location, order));
        }
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, matrix);
        routes.push(route);
    }
    routes
}

/// A deterministic textual key identifying a full solution's stop order, for
/// the tabu memory (§4.8): every route's interior stop ids joined with `-`,
/// then the per-route strings sorted and joined with `|`.
pub fn solution_key(routes: &[Route]) -> String {
    let mut parts: Vec<String> = routes
        .iter()
        .map(|r| r.interior().iter().map(|s| s.location_id.as_str()).collect::<Vec<_>>().join("-"))
        .collect();
    parts.sort();
    parts.join("|")
}

/// Pick a uniformly random route with at least `min_interior` interior
/// stops, if one exists.
pub fn pick_route_with_at_least<'a>(routes: &'a mut [Route], min_interior: usize, rng: &mut impl Rng) -> Option<&'a mut Route> {
    let candidates: Vec<usize> = routes
        .iter()
        .enumerate()
        .filter(|(_, r)| r.interior_len() >= min_interior)
        .map(|(i, _)| i)
        .collect();
    let idx = *candidates.choose(rng)?;
    routes.get_mut(idx)
}
