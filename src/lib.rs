//! Capacitated Vehicle Routing Problem solver: constructive heuristics,
//! local search, and metaheuristics over a shared route model (§1-§3).

pub mod assignment;
pub mod cancellation;
pub mod compare;
pub mod constructors;
pub mod distance;
pub mod error;
pub mod external;
pub mod geo;
pub mod local_search;
pub mod metaheuristics;
pub mod route;
pub mod slots;
pub mod types;
pub mod utils;
pub mod validate;

pub use cancellation::CancellationToken;
pub use compare::SolveOptions;
pub use error::{VrpError, VrpResult};
pub use types::*;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::distance::DistanceMatrix;
use crate::geo::Coordinate;
use crate::local_search::{basic_local_search, enhanced_local_search};

/// Which of the two high-level solve modes the caller wants (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Run exactly one algorithm; a failure propagates as `AlgorithmFailure`.
    Single(AlgorithmKey),
    /// Run every registered algorithm and select a winner (§4.14).
    Compare,
}

/// The high-level entry point's return value (§6): preserves the field
/// names of the persisted shape verbatim, because downstream code binds to
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutput {
    pub selected_algorithm: AlgorithmKey,
    pub routes: Vec<Route>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub algorithm_results: Vec<AlgorithmResult>,
    pub comparison_run: bool,
}

/// Solve one instance (§6). Validates the instance first (`BadInput` short
/// circuits before any algorithm runs, §7), then either runs a single
/// algorithm or the full comparison driver depending on `mode`.
#[instrument(skip(instance, options), fields(locations = instance.locations.len(), vehicles = instance.vehicles.len()))]
pub fn solve(instance: &Instance, mode: SolveMode, options: SolveOptions) -> VrpResult<SolveOutput> {
    validate::validate_instance(instance)?;

    if options.cancellation.as_ref().is_some_and(|c| c.is_cancelled()) {
        return Err(VrpError::Cancelled);
    }

    match mode {
        SolveMode::Compare => {
            let (algorithm_results, selected_algorithm) = compare::run_comparison(instance, &options);
            let winner = algorithm_results
                .iter()
                .find(|r| r.algorithm == selected_algorithm)
                .expect("selected_algorithm is always drawn from algorithm_results");
            let routes = winner.solution.as_ref().map(|s| s.routes.clone()).unwrap_or_default();
            let total_distance_km = winner.total_distance_km;
            let total_duration_min = winner.total_duration_min;

            Ok(SolveOutput {
                selected_algorithm,
                routes,
                total_distance_km,
                total_duration_min,
                algorithm_results,
                comparison_run: true,
            })
        }
        SolveMode::Single(algorithm) => {
            let depot = instance.depot().expect("validate_instance checked exactly one depot");
            let matrix = build_matrix(instance);

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| single_algorithm_routes(algorithm, instance, depot, &matrix, &options)));

            let routes = outcome.map_err(|panic| {
                let message = compare::panic_message(&panic);
                VrpError::algorithm_failure(algorithm.as_str(), message)
            })?;

            let total_distance_km = routes.iter().map(|r| r.distance_km).sum();
            let total_duration_min = routes.iter().map(|r| r.duration_min).sum();
            let total_fleet_capacity = instance.total_fleet_capacity();
            let total_non_depot = instance.non_depot_locations().count();
            let solution = Solution::summarize(routes.clone(), algorithm, 0.0, total_non_depot, total_fleet_capacity);
            let algorithm_results = vec![AlgorithmResult::from_solution(algorithm, solution, total_fleet_capacity)];

            Ok(SolveOutput {
                selected_algorithm: algorithm,
                routes,
                total_distance_km,
                total_duration_min,
                algorithm_results,
                comparison_run: false,
            })
        }
    }
}

fn build_matrix(instance: &Instance) -> DistanceMatrix {
    let pairs: Vec<(LocationId, Coordinate)> = instance.locations.iter().map(|l| (l.id.clone(), l.coordinate())).collect();
    DistanceMatrix::build(&pairs)
}

fn single_algorithm_routes(algorithm: AlgorithmKey, instance: &Instance, depot: &Location, matrix: &DistanceMatrix, options: &SolveOptions) -> Vec<Route> {
    let locations = &instance.locations;
    let vehicles = &instance.vehicles;
    let cancellation = options.cancellation.as_ref();

    let (raw, kernel): (Vec<Route>, fn(&mut Route, &DistanceMatrix)) = match algorithm {
        AlgorithmKey::ClarkeWright => (constructors::clarke_wright::solve(locations, vehicles, depot, matrix), basic_local_search as fn(&mut Route, &DistanceMatrix)),
        AlgorithmKey::EnhancedClarkeWright => (constructors::clarke_wright::solve_enhanced(locations, vehicles, depot, matrix), enhanced_local_search),
        AlgorithmKey::NearestNeighbor => (constructors::nearest_neighbor::solve(locations, vehicles, depot, matrix), noop_kernel),
        AlgorithmKey::TabuSearch => (metaheuristics::tabu_search::solve(locations, vehicles, depot, matrix, cancellation), noop_kernel),
        AlgorithmKey::SimulatedAnnealing => (metaheuristics::simulated_annealing::solve(locations, vehicles, depot, matrix, options.seed, cancellation), noop_kernel),
        AlgorithmKey::Genetic => (metaheuristics::genetic::solve(locations, vehicles, depot, matrix, options.seed, cancellation), noop_kernel),
        AlgorithmKey::AntColony => (metaheuristics::ant_colony::solve(locations, vehicles, depot, matrix, options.seed, cancellation), noop_kernel),
        AlgorithmKey::OrTools => {
            let endpoint = options.external_endpoint.as_deref().unwrap_or("https://external-cvrp.invalid/solve");
            (external::solve(endpoint, locations, vehicles, depot, matrix), enhanced_local_search)
        }
    };

    assignment::assign(raw, vehicles, matrix, kernel)
}

fn noop_kernel(_route: &mut Route, _matrix: &DistanceMatrix) {}
