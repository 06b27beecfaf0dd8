//! Parallel simulation execution using rayon.
//!
//! Runs of the same config differ only in their seed; they share no state.

use bikeshare_core::error::SimulationError;
use bikeshare_core::network::StationNetwork;
use bikeshare_core::scenario::SimulationConfig;
use bikeshare_core::simulation::{Simulation, SimulationResult};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use crate::error::ExperimentError;

/// Runs one simulation to the horizon and returns its result document.
pub fn run_single_simulation(
    config: &SimulationConfig,
    network: &StationNetwork,
) -> Result<SimulationResult, SimulationError> {
    let mut simulation = Simulation::new(config.clone(), network.clone())?;
    Ok(simulation.run().clone())
}

/// Config of run `run` in a repeated experiment: the base seed offset by the run index.
/// Unseeded configs stay unseeded, so every run draws fresh entropy.
pub fn config_for_run(config: &SimulationConfig, run: usize) -> SimulationConfig {
    let mut config = config.clone();
    config.seed = config.seed.map(|seed| seed.wrapping_add(run as u64));
    config
}

/// Runs `n_runs` independent simulations in parallel.
///
/// Results come back in run order. `num_threads` of `None` uses rayon's default.
pub fn run_repeated(
    config: &SimulationConfig,
    network: &StationNetwork,
    n_runs: usize,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<SimulationResult>, ExperimentError> {
    let pb = (show_progress && n_runs > 0).then(|| {
        let bar = ProgressBar::new(n_runs as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar
    });

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    info!(n_runs, threads = pool.current_num_threads(), "starting repeated runs");
    let results: Result<Vec<_>, SimulationError> = pool.install(|| {
        (0..n_runs)
            .into_par_iter()
            .map(|run| {
                let result = run_single_simulation(&config_for_run(config, run), network);
                if let Some(bar) = &pb {
                    bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(bar) = &pb {
        bar.finish_with_message("Completed");
    }
    Ok(results?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_core::test_helpers::{tiny_config, two_station_network};

    #[test]
    fn single_simulation_reports_every_entry() {
        let result = run_single_simulation(&tiny_config(1), &two_station_network()).expect("run");
        assert_eq!(result.report.len(), 10);
        assert!(result.total_riders <= 1);
    }

    #[test]
    fn repeated_runs_offset_the_seed() {
        let config = tiny_config(100);
        let results =
            run_repeated(&config, &two_station_network(), 3, Some(2), false).expect("runs");
        assert_eq!(results.len(), 3);

        let again = run_single_simulation(&config_for_run(&config, 2), &two_station_network())
            .expect("run");
        assert_eq!(results[2], again);
        assert_eq!(config_for_run(&config, 2).seed, Some(102));
    }

    #[test]
    fn unseeded_runs_stay_unseeded() {
        let config = tiny_config(0);
        let unseeded = SimulationConfig {
            seed: None,
            ..config
        };
        assert_eq!(config_for_run(&unseeded, 5).seed, None);
    }
}
