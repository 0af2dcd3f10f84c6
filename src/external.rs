//! The external-solver adapter (§4.12): a synchronous call to an opaque
//! remote CVRP service, falling back to Enhanced Clarke-Wright on any
//! failure. Uses `reqwest`'s blocking client so the CORE stays synchronous
//! (§5) without pulling in an async runtime.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constructors::clarke_wright;
use crate::distance::DistanceMatrix;
use crate::route::{recompute_route_metrics, renumber_stops};
use crate::types::{Location, LocationId, Route, Stop, VehicleType};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Private to this module by design: on any variant, the caller never sees
/// it directly. `solve` always translates it into an Enhanced Clarke-Wright
/// solve before returning (§7).
#[derive(thiserror::Error, Debug)]
enum ExternalSolverError {
    #[error("network error: {0}")]
    Network(String),
    #[error("remote solver returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct ExternalLocation<'a> {
    id: &'a LocationId,
    lat: f64,
    lon: f64,
    demand: u32,
}

#[derive(Serialize)]
struct ExternalVehicle<'a> {
    id: &'a str,
    capacity: u32,
    #[serde(rename = "type")]
    vehicle_type: &'a str,
    per_km_cost: f64,
}

#[derive(Serialize, Default)]
struct ExternalFlags {
    allow_partial: bool,
}

#[derive(Serialize)]
struct ExternalRequest<'a> {
    locations: Vec<ExternalLocation<'a>>,
    vehicles: Vec<ExternalVehicle<'a>>,
    demands: Vec<u32>,
    flags: ExternalFlags,
}

#[derive(Deserialize)]
struct ExternalRoute {
    #[serde(rename = "Vehicle ID")]
    #[allow(dead_code)]
    vehicle_id: String,
    /// Indices into the request's `locations` list, depot-first.
    #[serde(rename = "Route Indices")]
    route_indices: Vec<usize>,
    #[serde(rename = "Distance (km)")]
    #[allow(dead_code)]
    distance_km: f64,
    #[serde(rename = "Load Carried")]
    #[allow(dead_code)]
    load_carried: u32,
}

#[derive(Deserialize)]
struct ExternalResponse {
    result: Vec<ExternalRoute>,
}

/// Call the remote CVRP service at `endpoint`; on any failure, solve with
/// Enhanced Clarke-Wright instead (§4.12).
pub fn solve(endpoint: &str, locations: &[Location], vehicles: &[VehicleType], depot: &Location, matrix: &DistanceMatrix) -> Vec<Route> {
    let ordered: Vec<&Location> = std::iter::once(depot).chain(locations.iter().filter(|l| !l.is_depot)).collect();

    match call_remote(endpoint, &ordered, vehicles) {
        Ok(routes) => finalize(routes, &ordered, matrix),
        Err(error) => {
            warn!(%error, "external solver unavailable, falling back to enhanced clarke-wright");
            clarke_wright::solve_enhanced(locations, vehicles, depot, matrix)
        }
    }
}

fn call_remote(endpoint: &str, ordered: &[&Location], vehicles: &[VehicleType]) -> Result<Vec<Vec<usize>>, ExternalSolverError> {
    let request = ExternalRequest {
        locations: ordered
            .iter()
            .map(|l| ExternalLocation {
                id: &l.id,
                lat: l.lat,
                lon: l.lon,
                demand: l.effective_demand(),
            })
            .collect(),
        vehicles: vehicles
            .iter()
            .map(|v| ExternalVehicle {
                id: &v.id,
                capacity: v.capacity,
                vehicle_type: &v.id,
                per_km_cost: 1.0,
            })
            .collect(),
        demands: ordered.iter().map(|l| l.effective_demand()).collect(),
        flags: ExternalFlags::default(),
    };

    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ExternalSolverError::Network(e.to_string()))?;

    let response = client
        .post(endpoint)
        .json(&request)
        .send()
        .map_err(|e| ExternalSolverError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ExternalSolverError::Status(response.status().as_u16()));
    }

    let decoded: ExternalResponse = response.json().map_err(|e| ExternalSolverError::Malformed(e.to_string()))?;

    for route in &decoded.result {
        for &idx in &route.route_indices {
            if idx >= ordered.len() {
                return Err(ExternalSolverError::Malformed(format!("stop index {idx} out of range")));
            }
        }
    }

    Ok(decoded.result.into_iter().map(|r| r.route_indices).collect())
}

/// Decode each returned index list back into a native [`Route`], looking
/// each stop up by index into the original (depot-first) locations list,
/// then recompute metrics (§4.12).
fn finalize(index_routes: Vec<Vec<usize>>, ordered: &[&Location], matrix: &DistanceMatrix) -> Vec<Route> {
    let mut routes = Vec::with_capacity(index_routes.len());
    for indices in index_routes {
        let mut stops = Vec::with_capacity(indices.len() + 2);
        stops.push(Stop::from_location(ordered[0], 0));
        for &idx in indices.iter().filter(|&&i| i != 0) {
            stops.push(Stop::from_location(ordered[idx], stops.len()));
        }
        stops.push(Stop::from_location(ordered[0], stops.len()));

        let mut route = Route {
            stops,
            vehicle_slot: None,
            vehicle_name: None,
            distance_km: 0.0,
            duration_min: 0.0,
            total_capacity: 0,
            capacity_exceeded: false,
        };
        renumber_stops(&mut route);
        recompute_route_metrics(&mut route, matrix);
        routes.push(route);
    }
    routes
}
