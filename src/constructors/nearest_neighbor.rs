//! Nearest Neighbor construction (§4.6).

use crate::distance::DistanceMatrix;
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::slots::{expand_slots, Slot};
use crate::types::{Location, Route, Stop, VehicleType};

pub fn solve(locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
    let slots = expand_slots(vehicles);
    let mut unvisited: Vec<&Location> = locations.iter().filter(|l| !l.is_depot).collect();
    let mut routes = Vec::new();

    for slot in &slots {
        if unvisited.is_empty() {
            break;
        }
        if let Some(route) = build_route(depot, matrix, slot, &mut unvisited) {
            routes.push(route);
        }
    }

    for location in std::mem::take(&mut unvisited) {
        if let Some(slot) = slots.iter().find(|s| s.capacity >= location.effective_demand()) {
            let mut route = Route::new_empty(depot);
            route.stops.insert(1, Stop::from_location(location, 1));
            renumber_stops(&mut route);
            recompute_route_metrics(&mut route, matrix);
            let _ = slot; // feasibility check only; actual slot binding is the assigner's job (§4.13, §6)
            routes.push(route);
        }
    }

    routes
}

fn build_route(
    depot: &Location,
    matrix: &DistanceMatrix,
    slot: &Slot,
    unvisited: &mut Vec<&Location>,
) -> Option<Route> {
    let mut route = Route::new_empty(depot);
    let mut remaining_capacity = slot.capacity;
    let mut current_id = depot.id.clone();

    loop {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in unvisited.iter().enumerate() {
            let demand = candidate.effective_demand();
            if demand > remaining_capacity {
                continue;
            }
            let d = matrix.get(&current_id, &candidate.id);
            if best.map(|(_, best_d)| d < best_d).unwrap_or(true) {
                best = Some((idx, d));
            }
        }

        match best {
            Some((idx, _)) => {
                let location = unvisited.remove(idx);
                remaining_capacity -= location.effective_demand();
                let order = route.stops.len() - 1;
                route.stops.insert(order, Stop::from_location(location, order));
                current_id = location.id.clone();
            }
            None => break,
        }
    }

    if route.is_empty_route() {
        None
    } else {
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, matrix);
        Some(route)
    }
}
