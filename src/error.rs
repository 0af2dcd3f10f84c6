//! Error taxonomy for the CVRP solver.

/// Result type for CVRP operations.
pub type VrpResult<T> = Result<T, VrpError>;

/// Errors the CORE can report to a caller.
///
/// `ExternalSolverUnavailable` is deliberately absent here: it lives as a
/// private error inside [`crate::external`] and is always translated into a
/// fallback solve before it can cross this boundary.
#[derive(thiserror::Error, Debug)]
pub enum VrpError {
    /// Missing depot, empty fleet/locations, an oversized instance, or a
    /// non-finite coordinate. No solve is attempted.
    #[error("bad input: {0}")]
    BadInput(String),

    /// An algorithm raised an internal error while solving. Carries the
    /// algorithm tag so compare-mode can attribute the failure.
    #[error("algorithm '{algorithm}' failed: {message}")]
    AlgorithmFailure { algorithm: String, message: String },

    /// The cancellation token fired mid-solve.
    #[error("solve cancelled")]
    Cancelled,
}

impl VrpError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        VrpError::BadInput(message.into())
    }

    pub fn algorithm_failure(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        VrpError::AlgorithmFailure {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }
}
