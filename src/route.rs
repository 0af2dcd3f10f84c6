//! Route metrics recomputation (§4.2).

use crate::distance::DistanceMatrix;
use crate::geo::distance_to_duration_min;
use crate::types::Route;

/// Walk `route.stops` pairwise, sum matrix distances, and refresh
/// `distance_km`/`duration_min`/`total_capacity`. Idempotent: calling it
/// twice in a row yields identical metrics (§8), and must run after any
/// structural change before the route is exposed (§4.2).
pub fn recompute_route_metrics(route: &mut Route, matrix: &DistanceMatrix) {
    let mut distance_km = 0.0;
    for pair in route.stops.windows(2) {
        distance_km += matrix.get(&pair[0].location_id, &pair[1].location_id);
    }
    route.distance_km = crate::geo::round_km(distance_km);
    route.duration_min = distance_to_duration_min(route.distance_km);
    route.total_capacity = route.interior().iter().map(|s| s.demand).sum();
}

/// Renumber `order` on every stop to match its position in the sequence.
/// Required after any merge or splice (§4.13, §9).
pub fn renumber_stops(route: &mut Route) {
    for (i, stop) in route.stops.iter_mut().enumerate() {
        stop.order = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::types::{Location, Stop};

    fn matrix() -> DistanceMatrix {
        DistanceMatrix::build(&[
            ("D".to_string(), Coordinate::new(0.0, 0.0)),
            ("A".to_string(), Coordinate::new(0.0, 1.0)),
        ])
    }

    fn depot() -> Location {
        Location::depot("D", "Depot", 0.0, 0.0)
    }

    fn customer_a() -> Location {
        Location::new("A", "A", 0.0, 1.0, 5)
    }

    #[test]
    fn recompute_is_idempotent() {
        let m = matrix();
        let depot = depot();
        let a = customer_a();
        let mut route = Route::new_empty(&depot);
        route.stops.insert(1, Stop::from_location(&a, 1));
        renumber_stops(&mut route);

        recompute_route_metrics(&mut route, &m);
        let first = (route.distance_km, route.duration_min, route.total_capacity);
        recompute_route_metrics(&mut route, &m);
        let second = (route.distance_km, route.duration_min, route.total_capacity);
        assert_eq!(first, second);
    }

    #[test]
    fn distance_matches_haversine_round_trip() {
        let m = matrix();
        let depot = depot();
        let a = customer_a();
        let mut route = Route::new_empty(&depot);
        route.stops.insert(1, Stop::from_location(&a, 1));
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, &m);

        // D -> A -> D, 1 degree of longitude each way.
        assert!((route.distance_km - 2.0 * 111.195).abs() < 0.01);
        assert_eq!(route.total_capacity, 5);
    }

    #[test]
    fn duration_equals_rounded_formula() {
        let m = matrix();
        let depot = depot();
        let a = customer_a();
        let mut route = Route::new_empty(&depot);
        route.stops.insert(1, Stop::from_location(&a, 1));
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, &m);

        assert_eq!(route.duration_min, (route.distance_km / 40.0 * 60.0).round());
    }
}
