//! Vehicle assignment and repair (§4.13): bind constructed routes (some of
//! which may still lack a vehicle) onto the fleet's physical slots.

use tracing::warn;

use crate::distance::DistanceMatrix;
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::types::{Route, Stop, VehicleSlotId, VehicleType};

const UNASSIGNED_VEHICLE_NAME: &str = "Unassigned — Insufficient Capacity";

struct AssignableSlot {
    id: VehicleSlotId,
    name: String,
    capacity: u32,
    used: bool,
    current_load: u32,
}

fn expand(vehicles: &[VehicleType]) -> Vec<AssignableSlot> {
    let mut slots = Vec::new();
    for vehicle in vehicles {
        for slot_index in 0..vehicle.count {
            slots.push(AssignableSlot {
                id: VehicleSlotId { vehicle_type_id: vehicle.id.clone(), slot_index },
                name: vehicle.name.clone(),
                capacity: vehicle.capacity,
                used: false,
                current_load: 0,
            });
        }
    }
    slots
}

/// Run the full five-step assignment and repair pipeline, then recompute
/// metrics and re-apply `local_search` to every route (§4.13's closing
/// paragraph).
pub fn assign(routes: Vec<Route>, vehicles: &[VehicleType], matrix: &DistanceMatrix, local_search: impl Fn(&mut Route, &DistanceMatrix)) -> Vec<Route> {
    let mut routes = routes;
    let mut slots = expand(vehicles);
    let mut assigned = vec![false; routes.len()];
    let mut consumed = vec![false; routes.len()];
    let mut slot_owner: Vec<Option<usize>> = vec![None; slots.len()];

    let slot_order: Vec<usize> = {
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(slots[i].capacity));
        order
    };

    strict_assign(&mut routes, &mut slots, &slot_order, &mut assigned, &mut slot_owner);
    pack_into_existing(&mut routes, &mut slots, &slot_order, &mut assigned, &mut consumed, &slot_owner, matrix);
    split_oversized(&mut routes, &mut slots, &slot_order, &mut assigned, &mut consumed, matrix);
    claim_singleton_slots(&mut routes, &mut slots, &assigned, &consumed);

    let mut finished: Vec<Route> = routes
        .into_iter()
        .zip(consumed.iter())
        .filter(|(_, &was_consumed)| !was_consumed)
        .map(|(route, _)| route)
        .collect();

    for route in &mut finished {
        recompute_route_metrics(route, matrix);
        local_search(route, matrix);
        recompute_route_metrics(route, matrix);
        if route.vehicle_slot.is_none() && !route.capacity_exceeded {
            warn!(demand = route.total_capacity, "route left without a vehicle slot");
        }
    }

    finished
}

/// Step 2: sort routes by demand descending; for each, best-fit the unused
/// slot minimizing post-insertion slack.
fn strict_assign(routes: &mut [Route], slots: &mut [AssignableSlot], slot_order: &[usize], assigned: &mut [bool], slot_owner: &mut [Option<usize>]) {
    let mut route_order: Vec<usize> = (0..routes.len()).collect();
    route_order.sort_by_key(|&i| std::cmp::Reverse(routes[i].total_capacity));

    for route_idx in route_order {
        let demand = routes[route_idx].total_capacity;
        let mut best: Option<(usize, i64)> = None;
        for &slot_idx in slot_order {
            let slot = &slots[slot_idx];
            if slot.used || slot.capacity < demand {
                continue;
            }
            let slack = slot.capacity as i64 - (slot.current_load as i64 + demand as i64);
            if best.map(|(_, best_slack)| slack < best_slack).unwrap_or(true) {
                best = Some((slot_idx, slack));
            }
        }

        if let Some((slot_idx, _)) = best {
            slots[slot_idx].used = true;
            slots[slot_idx].current_load += demand;
            routes[route_idx].vehicle_slot = Some(slots[slot_idx].id.clone());
            routes[route_idx].vehicle_name = Some(slots[slot_idx].name.clone());
            slot_owner[slot_idx] = Some(route_idx);
            assigned[route_idx] = true;
        }
    }
}

/// Step 3: merge still-unassigned routes into an already-used slot with
/// enough remaining capacity.
fn pack_into_existing(
    routes: &mut [Route],
    slots: &mut [AssignableSlot],
    slot_order: &[usize],
    assigned: &mut [bool],
    consumed: &mut [bool],
    slot_owner: &[Option<usize>],
    matrix: &DistanceMatrix,
) {
    for route_idx in 0..routes.len() {
        if assigned[route_idx] {
            continue;
        }
        let demand = routes[route_idx].total_capacity;

        let target = slot_order.iter().copied().find(|&slot_idx| {
            let slot = &slots[slot_idx];
            slot.used && slot.capacity - slot.current_load >= demand
        });

        if let Some(slot_idx) = target {
            let owner_idx = slot_owner[slot_idx].expect("a used slot always has an owner route");
            merge_interior(owner_idx, route_idx, routes, matrix);
            slots[slot_idx].current_load += demand;
            assigned[route_idx] = true;
            consumed[route_idx] = true;
        }
    }
}

/// Splice `routes[donor_idx]`'s interior stops onto `routes[owner_idx]`
/// before its trailing depot, then renumber and recompute.
fn merge_interior(owner_idx: usize, donor_idx: usize, routes: &mut [Route], matrix: &DistanceMatrix) {
    let donor_interior: Vec<Stop> = routes[donor_idx].interior().to_vec();
    let owner = &mut routes[owner_idx];
    let insert_at = owner.stops.len() - 1;
    for (offset, stop) in donor_interior.into_iter().enumerate() {
        owner.stops.insert(insert_at + offset, stop);
    }
    renumber_stops(owner);
    recompute_route_metrics(owner, matrix);
}

/// Step 4: split a still-unassigned multi-stop route across fresh unused
/// slots, closing each out as its claimed slot fills up.
fn split_oversized(routes: &mut Vec<Route>, slots: &mut [AssignableSlot], slot_order: &[usize], assigned: &mut Vec<bool>, consumed: &mut Vec<bool>, matrix: &DistanceMatrix) {
    let candidates: Vec<usize> = (0..routes.len()).filter(|&i| !assigned[i] && !consumed[i] && routes[i].interior_len() > 1).collect();

    let mut new_routes: Vec<Route> = Vec::new();

    for route_idx in candidates {
        let depot_stop = routes[route_idx].stops[0].clone();
        let interior: Vec<Stop> = routes[route_idx].interior().to_vec();
        consumed[route_idx] = true;

        let mut current_slot: Option<usize> = None;
        let mut remaining_capacity: u32 = 0;
        let mut current_stops: Vec<Stop> = Vec::new();

        for stop in interior {
            let demand = stop.demand;
            let needs_new_slot = current_slot.is_none() || demand > remaining_capacity;

            if needs_new_slot {
                if let Some(slot_idx) = current_slot.take() {
                    new_routes.push(close_slot_route(&depot_stop, std::mem::take(&mut current_stops), slot_idx, slots, matrix));
                }

                match slot_order.iter().copied().find(|&si| !slots[si].used && slots[si].capacity >= demand) {
                    Some(slot_idx) => {
                        slots[slot_idx].used = true;
                        current_slot = Some(slot_idx);
                        remaining_capacity = slots[slot_idx].capacity;
                    }
                    None => {
                        warn!(location = %stop.location_id, "no slot can carry this stop during split repair; dropping it");
                        continue;
                    }
                }
            }

            current_stops.push(stop);
            remaining_capacity -= demand;
        }

        if let Some(slot_idx) = current_slot {
            new_routes.push(close_slot_route(&depot_stop, current_stops, slot_idx, slots, matrix));
        }
    }

    for route in new_routes {
        assigned.push(true);
        consumed.push(false);
        routes.push(route);
    }
}

fn close_slot_route(depot_stop: &Stop, interior: Vec<Stop>, slot_idx: usize, slots: &mut [AssignableSlot], matrix: &DistanceMatrix) -> Route {
    let mut stops = Vec::with_capacity(interior.len() + 2);
    stops.push(depot_stop.clone());
    stops.extend(interior);
    stops.push(depot_stop.clone());

    let mut route = Route {
        stops,
        vehicle_slot: Some(slots[slot_idx].id.clone()),
        vehicle_name: Some(slots[slot_idx].name.clone()),
        distance_km: 0.0,
        duration_min: 0.0,
        total_capacity: 0,
        capacity_exceeded: false,
    };
    renumber_stops(&mut route);
    recompute_route_metrics(&mut route, matrix);
    slots[slot_idx].current_load += route.total_capacity;
    route
}

/// Step 5: a remaining one-stop route takes any unused slot that fits, or
/// is marked `capacityExceeded` with no vehicle.
fn claim_singleton_slots(routes: &mut [Route], slots: &mut [AssignableSlot], assigned: &[bool], consumed: &[bool]) {
    for route_idx in 0..routes.len() {
        if assigned[route_idx] || consumed[route_idx] {
            continue;
        }
        let demand = routes[route_idx].total_capacity;
        let found = slots.iter().position(|s| !s.used && s.capacity >= demand);

        match found {
            Some(slot_idx) => {
                slots[slot_idx].used = true;
                slots[slot_idx].current_load += demand;
                routes[route_idx].vehicle_slot = Some(slots[slot_idx].id.clone());
                routes[route_idx].vehicle_name = Some(slots[slot_idx].name.clone());
            }
            None => {
                warn!(demand, "no slot fits this route; marking it capacity-exceeded");
                routes[route_idx].vehicle_slot = None;
                routes[route_idx].vehicle_name = Some(UNASSIGNED_VEHICLE_NAME.to_string());
                routes[route_idx].capacity_exceeded = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use crate::local_search::two_opt;
    use crate::types::Location;

    fn matrix() -> DistanceMatrix {
        DistanceMatrix::build(&[
            ("D".to_string(), crate::geo::Coordinate::new(0.0, 0.0)),
            ("A".to_string(), crate::geo::Coordinate::new(0.0, 1.0)),
            ("B".to_string(), crate::geo::Coordinate::new(0.0, 2.0)),
        ])
    }

    fn singleton_route(depot: &Location, loc: &Location) -> Route {
        let mut route = Route::new_empty(depot);
        route.stops.insert(1, Stop::from_location(loc, 1));
        renumber_stops(&mut route);
        route
    }

    #[test]
    fn assigns_a_route_to_a_fitting_slot() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 4);
        let matrix = matrix();
        let mut route = singleton_route(&depot, &a);
        recompute_route_metrics(&mut route, &matrix);

        let vehicles = vec![VehicleType::new("v", "Van", 10, 1)];
        let result = assign(vec![route], &vehicles, &matrix, |r, m| two_opt(r, m));

        assert_eq!(result.len(), 1);
        assert!(result[0].vehicle_slot.is_some());
        assert!(!result[0].capacity_exceeded);
    }

    #[test]
    fn marks_an_unfittable_route_as_capacity_exceeded() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 50);
        let matrix = matrix();
        let mut route = singleton_route(&depot, &a);
        recompute_route_metrics(&mut route, &matrix);

        let vehicles = vec![VehicleType::new("v", "Van", 10, 1)];
        let result = assign(vec![route], &vehicles, &matrix, |r, m| two_opt(r, m));

        assert_eq!(result.len(), 1);
        assert!(result[0].capacity_exceeded);
        assert!(result[0].vehicle_slot.is_none());
        assert_eq!(result[0].vehicle_name.as_deref(), Some(UNASSIGNED_VEHICLE_NAME));
    }

    #[test]
    fn packs_a_small_unassigned_route_into_an_already_used_slot() {
        let depot = Location::depot("D", "Depot", 0.0, 0.0);
        let a = Location::new("A", "A", 0.0, 1.0, 4);
        let b = Location::new("B", "B", 0.0, 2.0, 3);
        let matrix = matrix();

        let mut route_a = singleton_route(&depot, &a);
        recompute_route_metrics(&mut route_a, &matrix);
        let mut route_b = singleton_route(&depot, &b);
        recompute_route_metrics(&mut route_b, &matrix);

        // Only one slot, capacity 10: strict assignment takes the larger
        // route (A, demand 4), then step 3 must pack B's stop into it.
        let vehicles = vec![VehicleType::new("v", "Van", 10, 1)];
        let result = assign(vec![route_a, route_b], &vehicles, &matrix, |r, m| two_opt(r, m));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].total_capacity, 7);
        assert_eq!(result[0].interior_len(), 2);
    }
}
