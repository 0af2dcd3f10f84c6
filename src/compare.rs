//! The comparison driver (§4.14): run every algorithm in the registry on
//! one instance, isolate per-algorithm failures, and select a winner.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::info;

use crate::assignment::assign;
use crate::cancellation::CancellationToken;
use crate::constructors::{clarke_wright, nearest_neighbor};
use crate::distance::DistanceMatrix;
use crate::local_search::{basic_local_search, enhanced_local_search};
use crate::metaheuristics::{ant_colony, genetic, simulated_annealing, tabu_search};
use crate::types::{AlgorithmKey, AlgorithmResult, Instance, Route, Solution};

/// Per-solve knobs the comparison driver (and the high-level `solve` entry
/// point) needs beyond the instance itself (§5, §6).
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub seed: Option<u64>,
    pub external_endpoint: Option<String>,
    pub cancellation: Option<CancellationToken>,
}

/// Run every algorithm in [`AlgorithmKey::ALL`] against `instance`, collect
/// one [`AlgorithmResult`] per algorithm, and select the winner (§4.14).
///
/// Cancellation is consulted between algorithms (§5): once flagged, the
/// remaining registry entries are skipped and only the results gathered so
/// far are returned.
pub fn run_comparison(instance: &Instance, options: &SolveOptions) -> (Vec<AlgorithmResult>, AlgorithmKey) {
    let depot = instance.depot().expect("caller validated exactly one depot");
    let matrix = build_matrix(instance);
    let total_fleet_capacity = instance.total_fleet_capacity();
    let total_non_depot = instance.non_depot_locations().count();

    let mut results = Vec::with_capacity(AlgorithmKey::ALL.len());

    for algorithm in AlgorithmKey::ALL {
        if options.cancellation.as_ref().is_some_and(|c| c.is_cancelled()) {
            info!(algorithm = algorithm.as_str(), "comparison cancelled, returning partial results");
            break;
        }
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| run_one(algorithm, instance, depot, &matrix, options)));
        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let result = match outcome {
            Ok(routes) => {
                let solution = Solution::summarize(routes, algorithm, execution_time_ms, total_non_depot, total_fleet_capacity);
                info!(
                    algorithm = algorithm.as_str(),
                    coverage = solution.coverage_percent,
                    distance = solution.total_distance_km,
                    "algorithm finished"
                );
                AlgorithmResult::from_solution(algorithm, solution, total_fleet_capacity)
            }
            Err(panic) => {
                let message = panic_message(&panic);
                info!(algorithm = algorithm.as_str(), error = %message, "algorithm failed");
                AlgorithmResult::from_failure(algorithm, message, total_fleet_capacity)
            }
        };

        results.push(result);
    }

    let winner = select_winner(&results);
    info!(winner = winner.as_str(), "comparison winner selected");
    (results, winner)
}

fn build_matrix(instance: &Instance) -> DistanceMatrix {
    let pairs: Vec<(crate::types::LocationId, crate::geo::Coordinate)> =
        instance.locations.iter().map(|l| (l.id.clone(), l.coordinate())).collect();
    DistanceMatrix::build(&pairs)
}

fn run_one(algorithm: AlgorithmKey, instance: &Instance, depot: &crate::types::Location, matrix: &DistanceMatrix, options: &SolveOptions) -> Vec<Route> {
    let locations = &instance.locations;
    let vehicles = &instance.vehicles;

    let cancellation = options.cancellation.as_ref();

    let (raw, kernel): (Vec<Route>, fn(&mut Route, &DistanceMatrix)) = match algorithm {
        AlgorithmKey::ClarkeWright => (clarke_wright::solve(locations, vehicles, depot, matrix), basic_local_search),
        AlgorithmKey::EnhancedClarkeWright => (clarke_wright::solve_enhanced(locations, vehicles, depot, matrix), enhanced_local_search),
        AlgorithmKey::NearestNeighbor => (nearest_neighbor::solve(locations, vehicles, depot, matrix), no_op_kernel),
        AlgorithmKey::TabuSearch => (tabu_search::solve(locations, vehicles, depot, matrix, cancellation), no_op_kernel),
        AlgorithmKey::SimulatedAnnealing => (simulated_annealing::solve(locations, vehicles, depot, matrix, options.seed, cancellation), no_op_kernel),
        AlgorithmKey::Genetic => (genetic::solve(locations, vehicles, depot, matrix, options.seed, cancellation), no_op_kernel),
        AlgorithmKey::AntColony => (ant_colony::solve(locations, vehicles, depot, matrix, options.seed, cancellation), no_op_kernel),
        AlgorithmKey::OrTools => {
            let endpoint = options.external_endpoint.as_deref().unwrap_or("https://external-cvrp.invalid/solve");
            (crate::external::solve(endpoint, locations, vehicles, depot, matrix), enhanced_local_search)
        }
    };

    assign(raw, vehicles, matrix, kernel)
}

fn no_op_kernel(_route: &mut Route, _matrix: &DistanceMatrix) {}

/// Lexicographic winner rule (§4.14): max coverage, tie-break min total
/// distance, ties broken by insertion order; falls back to the first
/// result if none succeeded.
fn select_winner(results: &[AlgorithmResult]) -> AlgorithmKey {
    let mut winner: Option<&AlgorithmResult> = None;
    for candidate in results.iter().filter(|r| r.is_ok()) {
        winner = Some(match winner {
            None => candidate,
            Some(current) if is_strictly_better(candidate, current) => candidate,
            Some(current) => current,
        });
    }
    winner
        .or_else(|| results.first())
        .map(|r| r.algorithm)
        .unwrap_or(AlgorithmKey::ClarkeWright)
}

/// `true` only when `candidate` beats `current` outright, so an exact tie
/// keeps whichever came first (§4.14, §8: "winner is the first in
/// insertion order").
fn is_strictly_better(candidate: &AlgorithmResult, current: &AlgorithmResult) -> bool {
    if candidate.coverage_percent != current.coverage_percent {
        candidate.coverage_percent > current.coverage_percent
    } else {
        candidate.total_distance_km < current.total_distance_km
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "algorithm panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, VehicleType};

    fn small_instance() -> Instance {
        Instance::new(
            vec![
                Location::depot("D", "Depot", 0.0, 0.0),
                Location::new("A", "A", 0.0, 1.0, 3),
                Location::new("B", "B", 0.0, 2.0, 3),
            ],
            vec![VehicleType::new("v", "Van", 10, 2)],
        )
    }

    fn lock_genetic_for_test() -> std::sync::MutexGuard<'static, ()> {
        crate::metaheuristics::genetic::TEST_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn runs_every_registered_algorithm() {
        let _guard = lock_genetic_for_test();
        let instance = small_instance();
        let (results, _winner) = run_comparison(&instance, &SolveOptions::default());
        assert_eq!(results.len(), AlgorithmKey::ALL.len());
    }

    #[test]
    fn winner_has_no_error() {
        let _guard = lock_genetic_for_test();
        let instance = small_instance();
        let (results, winner) = run_comparison(&instance, &SolveOptions::default());
        let winning_result = results.iter().find(|r| r.algorithm == winner).unwrap();
        assert!(winning_result.is_ok());
    }

    #[test]
    fn isolates_a_single_algorithm_failure() {
        // S6: Genetic Algorithm throws; compare mode still completes, the
        // failure is localized, and the winner comes from the other seven.
        use std::sync::atomic::Ordering;

        use crate::metaheuristics::genetic::FORCE_FAILURE;

        let _guard = lock_genetic_for_test();
        FORCE_FAILURE.store(true, Ordering::SeqCst);
        let instance = small_instance();
        let (results, winner) = run_comparison(&instance, &SolveOptions::default());
        FORCE_FAILURE.store(false, Ordering::SeqCst);

        assert_eq!(results.len(), AlgorithmKey::ALL.len());
        let genetic_result = results.iter().find(|r| r.algorithm == AlgorithmKey::Genetic).unwrap();
        assert!(!genetic_result.is_ok());
        assert_ne!(winner, AlgorithmKey::Genetic);
        let winning_result = results.iter().find(|r| r.algorithm == winner).unwrap();
        assert!(winning_result.is_ok());
    }

    #[test]
    fn returns_partial_results_when_pre_cancelled() {
        let instance = small_instance();
        let token = CancellationToken::new();
        token.cancel();
        let options = SolveOptions { cancellation: Some(token), ..Default::default() };
        let (results, _winner) = run_comparison(&instance, &options);
        assert!(results.is_empty());
    }
}
