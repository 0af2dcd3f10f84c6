//! Sweep construction (§4.7). A building block only: §9 notes it is not
//! reachable through [`crate::solve`]'s registry, only used directly or by
//! other building blocks that need an angular ordering.

use crate::distance::DistanceMatrix;
use crate::geo::bearing_from_depot;
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::slots::expand_slots;
use crate::types::{Location, Route, Stop, VehicleType};

pub fn solve(locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
    let slots = expand_slots(vehicles);
    if slots.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Location> = locations.iter().filter(|l| !l.is_depot).collect();
    sorted.sort_by(|a, b| {
        bearing_from_depot(depot.coordinate(), a.coordinate())
            .partial_cmp(&bearing_from_depot(depot.coordinate(), b.coordinate()))
            .unwrap()
    });

    let mut routes = Vec::new();
    let mut slot_idx = 0;
    let mut route = Route::new_empty(depot);
    let mut remaining_capacity = slots[slot_idx].capacity;

    for location in sorted {
        let demand = location.effective_demand();
        while demand > remaining_capacity {
            if !route.is_empty_route() {
                finish_route(&mut route, matrix, &mut routes);
            }
            slot_idx += 1;
            if slot_idx >= slots.len() {
                return routes; // no slot left can carry the remaining locations
            }
            route = Route::new_empty(depot);
            remaining_capacity = slots[slot_idx].capacity;
        }
        let order = route.stops.len() - 1;
        route.stops.insert(order, Stop::from_location(location, order));
        remaining_capacity -= demand;
    }

    if !route.is_empty_route() {
        finish_route(&mut route, matrix, &mut routes);
    }

    routes
}

fn finish_route(route: &mut Route, matrix: &DistanceMatrix, routes: &mut Vec<Route>) {
    renumber_stops(route);
    recompute_route_metrics(route, matrix);
    routes.push(std::mem::replace(route, Route { stops: Vec::new(), vehicle_slot: None, vehicle_name: None, distance_km: 0.0, duration_min: 0.0, total_capacity: 0, capacity_exceeded: false }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_customers_angularly_until_capacity_is_exhausted() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 6);
        let b = Location::new("B", "B", 0.0, -1.0, 6);
        let locations = vec![depot.clone(), a.clone(), b.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 2)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
        ]);

        let routes = solve(&locations, &vehicles, &depot, &matrix);
        let served: usize = routes.iter().map(|r| r.interior_len()).sum();
        assert_eq!(served, 2);
    }
}
