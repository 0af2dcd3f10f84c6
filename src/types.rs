//! Core data structures for the CVRP solver (§3).

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Stable identifier for a [`Location`].
pub type LocationId = String;

/// Stable identifier for a [`VehicleType`].
pub type VehicleTypeId = String;

/// A demand location, or the depot when [`Location::is_depot`] is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub demand: u32,
    pub is_depot: bool,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>, lat: f64, lon: f64, demand: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            demand,
            is_depot: false,
        }
    }

    pub fn depot(id: impl Into<LocationId>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            demand: 0,
            is_depot: true,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// The depot's demand is always treated as zero for capacity purposes,
    /// even if the input data carries something else (§3).
    pub fn effective_demand(&self) -> u32 {
        if self.is_depot {
            0
        } else {
            self.demand
        }
    }
}

/// A class of vehicle: `count` independent, indistinguishable slots each
/// carrying up to `capacity` units of demand (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    pub name: String,
    pub capacity: u32,
    pub count: u32,
}

impl VehicleType {
    pub fn new(id: impl Into<VehicleTypeId>, name: impl Into<String>, capacity: u32, count: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            count,
        }
    }
}

/// One stop inside a [`Route`], denormalizing the location's identity so
/// inner loops of the savings/metaheuristic search never chase a pointer
/// back into the locations table (§9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub location_id: LocationId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub demand: u32,
    pub order: usize,
}

impl Stop {
    pub fn from_location(location: &Location, order: usize) -> Self {
        Self {
            location_id: location.id.clone(),
            name: location.name.clone(),
            lat: location.lat,
            lon: location.lon,
            demand: location.effective_demand(),
            order,
        }
    }
}

/// A single physical vehicle: one of `VehicleType::count` indistinguishable
/// instances, identified only by its type and an index (§3's "Slot").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct VehicleSlotId {
    pub vehicle_type_id: VehicleTypeId,
    pub slot_index: u32,
}

/// An ordered sequence of stops beginning and ending at the depot (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub stops: Vec<Stop>,
    pub vehicle_slot: Option<VehicleSlotId>,
    pub vehicle_name: Option<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub total_capacity: u32,
    /// Set by the assigner (§4.13 step 5) when no slot can carry this route.
    pub capacity_exceeded: bool,
}

impl Route {
    /// A fresh route visiting no one but the depot at both ends.
    pub fn new_empty(depot: &Location) -> Self {
        let depot_stop = Stop::from_location(depot, 0);
        Self {
            stops: vec![depot_stop.clone(), {
                let mut s = depot_stop;
                s.order = 1;
                s
            }],
            vehicle_slot: None,
            vehicle_name: None,
            distance_km: 0.0,
            duration_min: 0.0,
            total_capacity: 0,
            capacity_exceeded: false,
        }
    }

    /// Interior stops: everything strictly between the two depot sentinels.
    pub fn interior(&self) -> &[Stop] {
        if self.stops.len() <= 2 {
            &[]
        } else {
            &self.stops[1..self.stops.len() - 1]
        }
    }

    pub fn interior_len(&self) -> usize {
        self.stops.len().saturating_sub(2)
    }

    pub fn is_empty_route(&self) -> bool {
        self.interior_len() == 0
    }
}

/// An ordered list of routes produced by one algorithm run (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub algorithm: AlgorithmKey,
    pub execution_time_ms: f64,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub locations_served: usize,
    pub coverage_percent: f64,
    pub vehicle_utilization_percent: f64,
    pub routes_count: usize,
}

impl Solution {
    /// Build a solution and its derived aggregates from a finished set of
    /// routes (§3: totalDistance, totalDuration, coverage, utilization,
    /// routes count are all derived, never tracked independently).
    pub fn summarize(
        routes: Vec<Route>,
        algorithm: AlgorithmKey,
        execution_time_ms: f64,
        total_non_depot_locations: usize,
        total_fleet_capacity: u32,
    ) -> Self {
        let total_distance_km = routes.iter().map(|r| r.distance_km).sum();
        let total_duration_min = routes.iter().map(|r| r.duration_min).sum();
        let locations_served: usize = routes.iter().map(|r| r.interior_len()).sum();
        let total_demand_served: u32 = routes.iter().map(|r| r.total_capacity).sum();

        let coverage_percent = if total_non_depot_locations == 0 {
            0.0
        } else {
            (locations_served as f64 / total_non_depot_locations as f64) * 100.0
        };

        let vehicle_utilization_percent = if total_fleet_capacity == 0 {
            0.0
        } else {
            (total_demand_served as f64 / total_fleet_capacity as f64) * 100.0
        };

        Self {
            routes_count: routes.len(),
            routes,
            algorithm,
            execution_time_ms,
            total_distance_km,
            total_duration_min,
            locations_served,
            coverage_percent,
            vehicle_utilization_percent,
        }
    }
}

/// The registry of algorithms the comparison driver iterates over (§9:
/// "Represent the registry as a tagged variant"). `Sweep` is a building
/// block only (§4.7, §9) and deliberately has no tag here; it is not
/// reachable through [`crate::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKey {
    ClarkeWright,
    EnhancedClarkeWright,
    NearestNeighbor,
    Genetic,
    TabuSearch,
    SimulatedAnnealing,
    AntColony,
    OrTools,
}

impl AlgorithmKey {
    pub const ALL: [AlgorithmKey; 8] = [
        AlgorithmKey::ClarkeWright,
        AlgorithmKey::EnhancedClarkeWright,
        AlgorithmKey::NearestNeighbor,
        AlgorithmKey::Genetic,
        AlgorithmKey::TabuSearch,
        AlgorithmKey::SimulatedAnnealing,
        AlgorithmKey::AntColony,
        AlgorithmKey::OrTools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKey::ClarkeWright => "clarke-wright",
            AlgorithmKey::EnhancedClarkeWright => "enhanced-clarke-wright",
            AlgorithmKey::NearestNeighbor => "nearest-neighbor",
            AlgorithmKey::Genetic => "genetic",
            AlgorithmKey::TabuSearch => "tabu-search",
            AlgorithmKey::SimulatedAnnealing => "simulated-annealing",
            AlgorithmKey::AntColony => "ant-colony",
            AlgorithmKey::OrTools => "or-tools",
        }
    }
}

/// A [`Solution`] plus the per-algorithm tag the comparison driver uses to
/// keep results comparable even across a failure (§3, §4.14, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub algorithm: AlgorithmKey,
    pub solution: Option<Solution>,
    pub error: Option<String>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub execution_time_ms: f64,
    pub locations_served: usize,
    pub coverage_percent: f64,
    pub total_fleet_capacity: u32,
    pub vehicle_utilization_percent: f64,
    pub routes_count: usize,
    pub average_route_distance_km: f64,
    pub average_route_duration_min: f64,
}

impl AlgorithmResult {
    pub fn from_solution(algorithm: AlgorithmKey, solution: Solution, total_fleet_capacity: u32) -> Self {
        let routes_count = solution.routes_count;
        let average_route_distance_km = if routes_count == 0 {
            0.0
        } else {
            solution.total_distance_km / routes_count as f64
        };
        let average_route_duration_min = if routes_count == 0 {
            0.0
        } else {
            solution.total_duration_min / routes_count as f64
        };

        Self {
            algorithm,
            total_distance_km: solution.total_distance_km,
            total_duration_min: solution.total_duration_min,
            execution_time_ms: solution.execution_time_ms,
            locations_served: solution.locations_served,
            coverage_percent: solution.coverage_percent,
            total_fleet_capacity,
            vehicle_utilization_percent: solution.vehicle_utilization_percent,
            routes_count,
            average_route_distance_km,
            average_route_duration_min,
            solution: Some(solution),
            error: None,
        }
    }

    /// A zeroed-metrics failure record, per §7's `AlgorithmFailure` handling:
    /// the comparison driver keeps going, the failure is localized here.
    pub fn from_failure(algorithm: AlgorithmKey, message: impl Into<String>, total_fleet_capacity: u32) -> Self {
        Self {
            algorithm,
            solution: None,
            error: Some(message.into()),
            total_distance_km: 0.0,
            total_duration_min: 0.0,
            execution_time_ms: 0.0,
            locations_served: 0,
            coverage_percent: 0.0,
            total_fleet_capacity,
            vehicle_utilization_percent: 0.0,
            routes_count: 0,
            average_route_distance_km: 0.0,
            average_route_duration_min: 0.0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A CVRP problem instance: the locations (with exactly one depot) and the
/// heterogeneous fleet serving them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub locations: Vec<Location>,
    pub vehicles: Vec<VehicleType>,
}

impl Instance {
    pub fn new(locations: Vec<Location>, vehicles: Vec<VehicleType>) -> Self {
        Self { locations, vehicles }
    }

    pub fn depot(&self) -> Option<&Location> {
        self.locations.iter().find(|l| l.is_depot)
    }

    pub fn non_depot_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|l| !l.is_depot)
    }

    pub fn total_fleet_capacity(&self) -> u32 {
        self.vehicles.iter().map(|v| v.capacity * v.count).sum()
    }

    pub fn max_vehicle_capacity(&self) -> u32 {
        self.vehicles.iter().map(|v| v.capacity).max().unwrap_or(0)
    }

    pub fn total_slots(&self) -> u32 {
        self.vehicles.iter().map(|v| v.count).sum()
    }
}
