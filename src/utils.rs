//! JSON I/O and reporting helpers around [`crate::types::Instance`] and
//! [`crate::SolveOutput`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::types::Instance;
use crate::{SolveOutput, VrpError, VrpResult};

/// Load a problem instance from a JSON file.
pub fn load_instance_from_json<P: AsRef<Path>>(path: P) -> VrpResult<Instance> {
    let file = File::open(&path).map_err(|e| VrpError::bad_input(format!("cannot open {:?}: {e}", path.as_ref())))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| VrpError::bad_input(format!("cannot parse JSON: {e}")))
}

/// Save a problem instance to a JSON file, pretty-printed.
pub fn save_instance_to_json<P: AsRef<Path>>(instance: &Instance, path: P) -> VrpResult<()> {
    let file = File::create(&path).map_err(|e| VrpError::bad_input(format!("cannot create {:?}: {e}", path.as_ref())))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, instance).map_err(|e| VrpError::bad_input(format!("cannot write JSON: {e}")))
}

/// Save a solve result to a JSON file, pretty-printed.
pub fn save_output_to_json<P: AsRef<Path>>(output: &SolveOutput, path: P) -> VrpResult<()> {
    let file = File::create(&path).map_err(|e| VrpError::bad_input(format!("cannot create {:?}: {e}", path.as_ref())))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, output).map_err(|e| VrpError::bad_input(format!("cannot write JSON: {e}")))
}

/// A short human-readable summary of a solve result, for CLI output.
pub fn format_output_summary(output: &SolveOutput) -> String {
    let routes_count = output.routes.len();
    let average_distance_km = if routes_count == 0 { 0.0 } else { output.total_distance_km / routes_count as f64 };
    let overloaded = output.routes.iter().filter(|r| r.capacity_exceeded).count();

    format!(
        "Algorithm: {}\n\
         Comparison run: {}\n\
         Routes: {routes_count}\n\
         Total distance: {:.3} km\n\
         Total duration: {:.1} min\n\
         Average distance per route: {average_distance_km:.3} km\n\
         Overloaded routes: {overloaded}",
        output.selected_algorithm.as_str(),
        output.comparison_run,
        output.total_distance_km,
        output.total_duration_min,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, VehicleType};
    use crate::{AlgorithmKey, AlgorithmResult, Route, Solution};

    #[test]
    fn round_trips_an_instance_through_json() {
        let instance = Instance::new(
            vec![Location::depot("D", "Depot", 0.0, 0.0), Location::new("A", "A", 0.0, 1.0, 5)],
            vec![VehicleType::new("v", "Van", 10, 1)],
        );
        let dir = std::env::temp_dir();
        let path = dir.join(format!("cvrp-core-test-instance-{}.json", std::process::id()));
        save_instance_to_json(&instance, &path).unwrap();
        let loaded = load_instance_from_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.locations.len(), instance.locations.len());
        assert_eq!(loaded.vehicles.len(), instance.vehicles.len());
    }

    #[test]
    fn summary_reports_the_selected_algorithm() {
        let output = SolveOutput {
            selected_algorithm: AlgorithmKey::ClarkeWright,
            routes: Vec::<Route>::new(),
            total_distance_km: 0.0,
            total_duration_min: 0.0,
            algorithm_results: vec![AlgorithmResult::from_solution(AlgorithmKey::ClarkeWright, Solution::summarize(Vec::new(), AlgorithmKey::ClarkeWright, 0.0, 0, 0), 0)],
            comparison_run: false,
        };
        let summary = format_output_summary(&output);
        assert!(summary.contains("clarke-wright"));
    }
}
