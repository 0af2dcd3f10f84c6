//! Clarke-Wright savings construction, basic (§4.4) and enhanced (§4.5).

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::distance::DistanceMatrix;
use crate::geo::{angular_difference, bearing_from_depot};
use crate::local_search::{basic_local_search, enhanced_local_search};
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::types::{Location, LocationId, Route, Stop, VehicleType};

const MAX_REPAIR_PASSES: usize = 1000;

struct Saving {
    from: LocationId,
    to: LocationId,
    score: f64,
}

/// Basic Clarke-Wright: raw savings, basic local search (§4.4).
pub fn solve(locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
    let savings = basic_savings(locations, depot, matrix);
    let mut routes = merge_routes(locations, vehicles, depot, matrix, savings);
    for route in &mut routes {
        basic_local_search(route, matrix);
    }
    routes
}

/// Enhanced Clarke-Wright: savings enriched by the factors in §4.5, enhanced
/// local search (2-opt then Or-opt).
pub fn solve_enhanced(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
) -> Vec<Route> {
    let savings = enhanced_savings(locations, depot, matrix, vehicles);
    let mut routes = merge_routes(locations, vehicles, depot, matrix, savings);
    for route in &mut routes {
        enhanced_local_search(route, matrix);
    }
    routes
}

fn basic_savings(locations: &[Location], depot: &Location, matrix: &DistanceMatrix) -> Vec<Saving> {
    let customers: Vec<&Location> = locations.iter().filter(|l| !l.is_depot).collect();
    let mut savings = Vec::new();
    for (idx, i) in customers.iter().enumerate() {
        for j in customers.iter().skip(idx + 1) {
            let score = matrix.get(&depot.id, &i.id) + matrix.get(&depot.id, &j.id) - matrix.get(&i.id, &j.id);
            savings.push(Saving { from: i.id.clone(), to: j.id.clone(), score });
        }
    }
    savings.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    savings
}

fn enhanced_savings(
    locations: &[Location],
    depot: &Location,
    matrix: &DistanceMatrix,
    vehicles: &[VehicleType],
) -> Vec<Saving> {
    let max_capacity = vehicles.iter().map(|v| v.capacity).max().unwrap_or(0) as f64;
    let customers: Vec<&Location> = locations.iter().filter(|l| !l.is_depot).collect();
    let mut savings = Vec::new();

    for (idx, i) in customers.iter().enumerate() {
        for j in customers.iter().skip(idx + 1) {
            let basic = matrix.get(&depot.id, &i.id) + matrix.get(&depot.id, &j.id) - matrix.get(&i.id, &j.id);

            let theta_i = bearing_from_depot(depot.coordinate(), i.coordinate());
            let theta_j = bearing_from_depot(depot.coordinate(), j.coordinate());
            let angular_bonus = angular_difference(theta_i, theta_j) / std::f64::consts::PI;
            let angular_factor = 1.0 + 0.15 * angular_bonus;

            let combined_demand = (i.demand + j.demand) as f64;
            let capacity_factor = if max_capacity <= 0.0 {
                1.0
            } else if combined_demand <= max_capacity {
                1.0
            } else {
                (max_capacity / combined_demand).max(0.1)
            };

            let urgency_factor = if max_capacity <= 0.0 {
                1.0
            } else {
                (1.0 + (combined_demand / max_capacity) * 0.2).min(1.2)
            };

            let distance_ij = matrix.get(&i.id, &j.id);
            let distance_efficiency = (1.0 - distance_ij / 50.0).max(0.8);

            let time_compatibility = 1.0; // placeholder, see §4.5/§9

            let score = basic * angular_factor * capacity_factor * urgency_factor * distance_efficiency * time_compatibility;
            savings.push(Saving { from: i.id.clone(), to: j.id.clone(), score });
        }
    }
    savings.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    savings
}

/// Endpoints of a route used by the merge rule (§4.4): the ids at stop
/// index 1 (start) and stop index `len-2` (end) of the interior.
fn endpoints(route: &Route) -> Option<(LocationId, LocationId)> {
    let interior = route.interior();
    if interior.is_empty() {
        None
    } else {
        Some((interior[0].location_id.clone(), interior[interior.len() - 1].location_id.clone()))
    }
}

/// Splice `b`'s interior onto the end of `a`'s interior, keeping both depot
/// sentinels of `a`.
fn concat_routes(a: &Route, b: &Route) -> Route {
    let mut stops: Vec<Stop> = Vec::with_capacity(a.stops.len() + b.interior_len());
    stops.extend(a.stops[..a.stops.len() - 1].iter().cloned());
    stops.extend(b.interior().iter().cloned());
    stops.push(a.stops.last().unwrap().clone());

    let mut merged = Route {
        stops,
        vehicle_slot: None,
        vehicle_name: None,
        distance_km: 0.0,
        duration_min: 0.0,
        total_capacity: 0,
        capacity_exceeded: false,
    };
    renumber_stops(&mut merged);
    merged
}

fn merge_routes(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
    savings: Vec<Saving>,
) -> Vec<Route> {
    let max_capacity = vehicles.iter().map(|v| v.capacity).max().unwrap_or(0);

    let mut routes: Vec<Option<Route>> = Vec::new();
    let mut route_of: HashMap<LocationId, usize> = HashMap::new();

    for loc in locations.iter().filter(|l| !l.is_depot) {
        let mut route = Route::new_empty(depot);
        route.stops.insert(1, Stop::from_location(loc, 1));
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, matrix);
        route_of.insert(loc.id.clone(), routes.len());
        routes.push(Some(route));
    }

    for saving in &savings {
        let (Some(&ri), Some(&rj)) = (route_of.get(&saving.from), route_of.get(&saving.to)) else {
            continue;
        };
        if ri == rj {
            continue;
        }
        let (Some(route_i), Some(route_j)) = (routes[ri].as_ref(), routes[rj].as_ref()) else {
            continue;
        };

        let merged_demand = route_i.total_capacity + route_j.total_capacity;
        if merged_demand > max_capacity {
            continue;
        }

        let Some((i_start, i_end)) = endpoints(route_i) else { continue };
        let Some((j_start, j_end)) = endpoints(route_j) else { continue };

        let merged = if i_end == saving.from && j_start == saving.to {
            Some(concat_routes(route_i, route_j))
        } else if j_end == saving.to && i_start == saving.from {
            Some(concat_routes(route_j, route_i))
        } else if i_end == saving.to && j_start == saving.from {
            Some(concat_routes(route_i, route_j))
        } else if j_end == saving.from && i_start == saving.to {
            Some(concat_routes(route_j, route_i))
        } else {
            None
        };

        let Some(mut merged) = merged else { continue };
        recompute_route_metrics(&mut merged, matrix);

        for stop in merged.interior() {
            route_of.insert(stop.location_id.clone(), ri);
        }
        routes[ri] = Some(merged);
        routes[rj] = None;
    }

    let mut live: Vec<Route> = routes.into_iter().flatten().filter(|r| !r.is_empty_route()).collect();
    repair_slot_pressure(&mut live, vehicles, matrix, max_capacity);
    live
}

/// §4.4 post-merge step: while there are more routes than physical slots,
/// repeatedly endpoint-merge the smallest-demand mergeable pair.
fn repair_slot_pressure(routes: &mut Vec<Route>, vehicles: &[VehicleType], matrix: &DistanceMatrix, max_capacity: u32) {
    let total_slots: u32 = vehicles.iter().map(|v| v.count).sum();

    for _pass in 0..MAX_REPAIR_PASSES {
        if (routes.len() as u32) <= total_slots {
            return;
        }

        let mut order: Vec<usize> = (0..routes.len()).collect();
        order.sort_by_key(|&idx| routes[idx].total_capacity);

        let mut merged_any = false;
        'outer: for (a_pos, &a) in order.iter().enumerate() {
            for &b in order.iter().skip(a_pos + 1) {
                if routes[a].total_capacity + routes[b].total_capacity > max_capacity {
                    continue;
                }
                let Some((a_start, a_end)) = endpoints(&routes[a]) else { continue };
                let Some((b_start, b_end)) = endpoints(&routes[b]) else { continue };

                // Endpoint-merge: join whichever end-to-start pairing is
                // shorter, `a` onto `b` or `b` onto `a`.
                let a_onto_b = matrix.get(&a_end, &b_start);
                let b_onto_a = matrix.get(&b_end, &a_start);
                let mut merged = if a_onto_b <= b_onto_a {
                    concat_routes(&routes[a], &routes[b])
                } else {
                    concat_routes(&routes[b], &routes[a])
                };
                recompute_route_metrics(&mut merged, matrix);

                let (keep, drop) = if a < b { (a, b) } else { (b, a) };
                routes[keep] = merged;
                routes.remove(drop);
                merged_any = true;
                break 'outer;
            }
        }

        if !merged_any {
            warn!(routes = routes.len(), total_slots, "slot-pressure repair could not reduce route count further");
            return;
        }
    }
    debug!("slot-pressure repair hit the 1000-pass safety bound");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depot() -> Location {
        Location::depot("D", "Depot", 0.0, 0.0)
    }

    #[test]
    fn merges_two_customers_with_positive_savings() {
        // S3: merge into a single route when capacity allows.
        let depot = depot();
        let a = Location::new("A", "A", 0.0, 1.0, 3);
        let b = Location::new("B", "B", 0.0, 2.0, 3);
        let locations = vec![depot.clone(), a.clone(), b.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 2)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
        ]);

        let routes = solve(&locations, &vehicles, &depot, &matrix);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].total_capacity, 6);
    }

    #[test]
    fn refuses_a_merge_that_would_overflow_capacity() {
        // S4: positive savings but 8+8 > 10, so no merge happens.
        let depot = depot();
        let a = Location::new("A", "A", 0.0, 1.0, 8);
        let b = Location::new("B", "B", 0.0, 2.0, 8);
        let locations = vec![depot.clone(), a.clone(), b.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 10, 2)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
        ]);

        let routes = solve(&locations, &vehicles, &depot, &matrix);
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn enhanced_keeps_the_time_compatibility_placeholder_at_one() {
        // Not directly observable from the public API; this just documents
        // that enhanced scoring doesn't crash and produces valid routes.
        let depot = depot();
        let a = Location::new("A", "A", 0.1, 0.1, 4);
        let b = Location::new("B", "B", -0.1, 0.2, 4);
        let locations = vec![depot.clone(), a.clone(), b.clone()];
        let vehicles = vec![VehicleType::new("v", "Van", 20, 1)];
        let matrix = DistanceMatrix::build(&[
            ("D".into(), depot.coordinate()),
            ("A".into(), a.coordinate()),
            ("B".into(), b.coordinate()),
        ]);

        let routes = solve_enhanced(&locations, &vehicles, &depot, &matrix);
        assert!(!routes.is_empty());
        for route in &routes {
            assert_eq!(route.stops.first().unwrap().location_id, "D");
            assert_eq!(route.stops.last().unwrap().location_id, "D");
        }
    }
}
