//! Local-search kernels operating on a single route's interior (§4.3).
//!
//! All three kernels use first-improvement descent, never best-improvement,
//! and never touch the depot sentinels at either end of `route.stops`.

mod or_opt;
mod three_opt;
mod two_opt;

pub use or_opt::or_opt;
pub use three_opt::three_opt_pass;
pub use two_opt::two_opt;

use crate::distance::DistanceMatrix;
use crate::types::Route;

/// The kernel basic Clarke-Wright runs after construction (§4.4): 2-opt to
/// convergence, one 3-opt pass, then 2-opt to convergence again.
pub fn basic_local_search(route: &mut Route, matrix: &DistanceMatrix) {
    two_opt(route, matrix);
    three_opt_pass(route, matrix);
    two_opt(route, matrix);
}

/// The kernel Enhanced Clarke-Wright runs after construction (§4.5): 2-opt
/// to a fixed point, then Or-opt sweeps for segment lengths 1-3.
pub fn enhanced_local_search(route: &mut Route, matrix: &DistanceMatrix) {
    two_opt(route, matrix);
    or_opt(route, matrix);
}
