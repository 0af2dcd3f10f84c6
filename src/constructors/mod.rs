//! Route-construction algorithms that share the route model and the
//! local-search kernels (§4.4-§4.7).

pub mod clarke_wright;
pub mod nearest_neighbor;
pub mod sweep;

use crate::distance::DistanceMatrix;
use crate::types::{Location, Route, VehicleType};

/// Low-level entry point shared by every constructor and metaheuristic
/// (§6): build routes with no vehicle assignment performed, the caller
/// invokes the assigner (§4.13) separately.
pub trait RouteConstructor {
    fn construct(&self, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route>;
    fn name(&self) -> &'static str;
}

pub struct ClarkeWright;
impl RouteConstructor for ClarkeWright {
    fn construct(&self, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
        clarke_wright::solve(locations, vehicles, depot, matrix)
    }
    fn name(&self) -> &'static str {
        "clarke-wright"
    }
}

pub struct EnhancedClarkeWright;
impl RouteConstructor for EnhancedClarkeWright {
    fn construct(&self, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
        clarke_wright::solve_enhanced(locations, vehicles, depot, matrix)
    }
    fn name(&self) -> &'static str {
        "enhanced-clarke-wright"
    }
}

pub struct NearestNeighbor;
impl RouteConstructor for NearestNeighbor {
    fn construct(&self, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
        nearest_neighbor::solve(locations, vehicles, depot, matrix)
    }
    fn name(&self) -> &'static str {
        "nearest-neighbor"
    }
}

pub struct Sweep;
impl RouteConstructor for Sweep {
    fn construct(&self, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
        sweep::solve(locations, vehicles, depot, matrix)
    }
    fn name(&self) -> &'static str {
        "sweep"
    }
}
