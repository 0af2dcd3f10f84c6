//! Command-line interface for the CVRP solver.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cvrp_core::{solve, AlgorithmKey, SolveMode, SolveOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    ClarkeWright,
    EnhancedClarkeWright,
    NearestNeighbor,
    Genetic,
    TabuSearch,
    SimulatedAnnealing,
    AntColony,
    OrTools,
}

impl From<AlgorithmArg> for AlgorithmKey {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::ClarkeWright => AlgorithmKey::ClarkeWright,
            AlgorithmArg::EnhancedClarkeWright => AlgorithmKey::EnhancedClarkeWright,
            AlgorithmArg::NearestNeighbor => AlgorithmKey::NearestNeighbor,
            AlgorithmArg::Genetic => AlgorithmKey::Genetic,
            AlgorithmArg::TabuSearch => AlgorithmKey::TabuSearch,
            AlgorithmArg::SimulatedAnnealing => AlgorithmKey::SimulatedAnnealing,
            AlgorithmArg::AntColony => AlgorithmKey::AntColony,
            AlgorithmArg::OrTools => AlgorithmKey::OrTools,
        }
    }
}

/// Solve a Capacitated Vehicle Routing Problem instance.
#[derive(Debug, Parser)]
#[command(name = "cvrp-cli", version, about)]
struct Cli {
    /// Path to the instance JSON file.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the solve result JSON to.
    #[arg(long)]
    output: PathBuf,

    /// Run a single named algorithm. Mutually exclusive with --compare.
    #[arg(long, value_enum, conflicts_with = "compare")]
    algorithm: Option<AlgorithmArg>,

    /// Run every registered algorithm and select a winner (§4.14).
    #[arg(long)]
    compare: bool,

    /// Seed the metaheuristics' PRNG for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Endpoint for the external CVRP solver backing the `or-tools` tag.
    #[arg(long)]
    external_endpoint: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    let instance = cvrp_core::utils::load_instance_from_json(&cli.input).with_context(|| format!("loading instance from {:?}", cli.input))?;

    let mode = match cli.algorithm {
        Some(algorithm) => SolveMode::Single(algorithm.into()),
        None if cli.compare => SolveMode::Compare,
        None => anyhow::bail!("pass either --algorithm <tag> or --compare"),
    };

    let options = SolveOptions {
        seed: cli.seed,
        external_endpoint: cli.external_endpoint,
        cancellation: None,
    };

    let output = solve(&instance, mode, options).context("solving instance")?;

    println!("{}", cvrp_core::utils::format_output_summary(&output));

    cvrp_core::utils::save_output_to_json(&output, &cli.output).with_context(|| format!("writing output to {:?}", cli.output))?;

    Ok(())
}
