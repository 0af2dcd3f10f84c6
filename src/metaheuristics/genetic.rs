//! Genetic Algorithm (§4.10): route-based crossover, interior-swap mutation,
//! one-slot elitism.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::distance::DistanceMatrix;
use crate::metaheuristics::{clamp_usize, pick_route_with_at_least, random_first_fit_solution, total_distance};
use crate::route::recompute_route_metrics;
use crate::types::{Location, Route, VehicleType};

const MUTATION_RATE: f64 = 0.1;
const CROSSOVER_RATE: f64 = 0.8;
const TOURNAMENT_SIZE: usize = 3;

/// Fault-injection switch for the comparison driver's failure-isolation
/// tests only; never set outside `#[cfg(test)]` code.
#[cfg(test)]
pub(crate) static FORCE_FAILURE: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Every test that calls into this module, directly or through the
/// comparison driver, takes this lock first. [`FORCE_FAILURE`] is global
/// state and tests run concurrently by default.
#[cfg(test)]
pub(crate) static TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

pub fn solve(
    locations: &[Location],
    vehicles: &[VehicleType],
    depot: &Location,
    matrix: &DistanceMatrix,
    seed: Option<u64>,
    cancellation: Option<&CancellationToken>,
) -> Vec<Route> {
    #[cfg(test)]
    if FORCE_FAILURE.load(std::sync::atomic::Ordering::SeqCst) {
        panic!("genetic algorithm forced failure for testing");
    }

    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let n = locations.iter().filter(|l| !l.is_depot).count();
    let population_size = clamp_usize(2 * n as i64, 10, 30);
    let generations = clamp_usize(2 * n as i64, 15, 50);

    let mut population: Vec<Vec<Route>> = (0..population_size)
        .map(|_| random_first_fit_solution(locations, vehicles, depot, matrix, &mut rng))
        .collect();

    let mut best = fittest(&population).clone();
    let mut best_cost = total_distance(&best);

    for generation in 0..generations {
        if cancellation.is_some_and(|c| c.is_cancelled()) {
            debug!(generation, "genetic algorithm cancelled");
            break;
        }
        let mut next_population = Vec::with_capacity(population_size);
        next_population.push(best.clone()); // one-slot elitism

        while next_population.len() < population_size {
            let parent_a = tournament_select(&population, TOURNAMENT_SIZE, &mut rng);
            let parent_b = tournament_select(&population, TOURNAMENT_SIZE, &mut rng);

            let mut child = if rng.gen::<f64>() < CROSSOVER_RATE {
                crossover(parent_a, parent_b, &mut rng)
            } else {
                parent_a.to_vec()
            };

            if rng.gen::<f64>() < MUTATION_RATE {
                mutate(&mut child, matrix, &mut rng);
            }

            next_population.push(child);
        }

        population = next_population;
        let candidate = fittest(&population);
        let candidate_cost = total_distance(candidate);
        if candidate_cost < best_cost {
            best_cost = candidate_cost;
            best = candidate.clone();
        }
        debug!(generation, best_cost, "genetic algorithm generation complete");
    }

    best
}

fn fittest(population: &[Vec<Route>]) -> &Vec<Route> {
    population
        .iter()
        .min_by(|a, b| total_distance(a).partial_cmp(&total_distance(b)).unwrap())
        .expect("population is never empty")
}

fn tournament_select<'a>(population: &'a [Vec<Route>], size: usize, rng: &mut impl Rng) -> &'a [Route] {
    let mut best: Option<&[Route]> = None;
    let mut best_cost = f64::INFINITY;
    for _ in 0..size {
        let idx = rng.gen_range(0..population.len());
        let cost = total_distance(&population[idx]);
        if cost < best_cost {
            best_cost = cost;
            best = Some(&population[idx]);
        }
    }
    best.expect("tournament size is never zero")
}

/// For each index from 0 to `max(|a|, |b|) - 1`, copy the route at that
/// index from a uniformly chosen parent (if both have it) or from whichever
/// parent has it (§4.10).
fn crossover(a: &[Route], b: &[Route], rng: &mut impl Rng) -> Vec<Route> {
    let max_len = a.len().max(b.len());
    let mut child = Vec::with_capacity(max_len);
    for idx in 0..max_len {
        let chosen = match (a.get(idx), b.get(idx)) {
            (Some(ra), Some(rb)) => {
                if rng.gen_bool(0.5) {
                    ra
                } else {
                    rb
                }
            }
            (Some(ra), None) => ra,
            (None, Some(rb)) => rb,
            (None, None) => continue,
        };
        child.push(chosen.clone());
    }
    child
}

fn mutate(child: &mut [Route], matrix: &DistanceMatrix, rng: &mut impl Rng) {
    if let Some(route) = pick_route_with_at_least(child, 2, rng) {
        let len = route.interior_len();
        let i = 1 + rng.gen_range(0..len);
        let mut j = 1 + rng.gen_range(0..len);
        while j == i {
            j = 1 + rng.gen_range(0..len);
        }
        route.stops.swap(i, j);
        recompute_route_metrics(route, matrix);
    }
}
