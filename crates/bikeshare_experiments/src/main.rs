use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bikeshare_core::network::{load_network, UnknownStationPolicy};
use bikeshare_core::scenario::SimulationConfig;
use bikeshare_core::simulation::Simulation;
use bikeshare_core::stations::StationCapacity;
use bikeshare_experiments::{
    check_result_path, run_repeated, save_result, save_summary, summarize_report, summary_format,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bikeshare",
    about = "Discrete-event simulation of a bike-share station network",
    long_about = "Simulates riders taking and returning bikes across a station network\n\
                  loaded from start-probability and trip-count tables."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and log its report
    Run {
        #[command(flatten)]
        sim: SimulationArgs,
        /// Write the result document to this file (must end in .json)
        #[arg(long, short = 'o')]
        save_results: Option<PathBuf>,
    },
    /// Repeat the simulation and print a confidence interval per report entry
    Confidence {
        #[command(flatten)]
        sim: SimulationArgs,
        /// Number of independent runs
        #[arg(long, default_value_t = 10)]
        n_runs: usize,
        /// Two-sided confidence level
        #[arg(long, default_value_t = 0.9)]
        confidence: f64,
        /// Worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
        /// Write the summary to this file (.json or .csv)
        #[arg(long, short = 'o')]
        save_results: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SimulationArgs {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Cap on riders admitted over the whole run
    #[arg(long, short = 'r')]
    num_riders: Option<u64>,
    /// Mean rider arrivals per minute
    #[arg(long, short = 's')]
    mean_spawn_rate: Option<f64>,
    /// Initial bikes per station, -1 for unbounded
    #[arg(long, short = 'b', allow_negative_numbers = true)]
    bikes_per_station: Option<i64>,
    /// Mean of the log ride time
    #[arg(long)]
    ride_time_mean: Option<f64>,
    /// Standard deviation of the log ride time
    #[arg(long)]
    ride_time_std: Option<f64>,
    /// Horizon in minutes
    #[arg(long, short = 'e')]
    end_time: Option<u64>,
    /// Base seed; unseeded runs draw from entropy
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the post-run validation
    #[arg(long)]
    no_validation: bool,
    #[arg(long, short = 'p', default_value = "./data/start_station_probs.csv")]
    start_station_probs_file: PathBuf,
    #[arg(long, short = 't', default_value = "./data/trip_stats.csv")]
    trip_stats_file: PathBuf,
    /// Handling of trip rows naming stations missing from the start table
    #[arg(long, value_enum, default_value_t = UnknownStations::CatchAll)]
    unknown_stations: UnknownStations,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnknownStations {
    /// Route them to a catch-all station
    CatchAll,
    /// Ignore the row
    Drop,
    /// Fail the load
    Reject,
}

impl From<UnknownStations> for UnknownStationPolicy {
    fn from(value: UnknownStations) -> Self {
        match value {
            UnknownStations::CatchAll => UnknownStationPolicy::CatchAll,
            UnknownStations::Drop => UnknownStationPolicy::Drop,
            UnknownStations::Reject => UnknownStationPolicy::Reject,
        }
    }
}

// ── Config assembly ────────────────────────────────────────────────

impl SimulationArgs {
    fn config(&self) -> Result<SimulationConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(n) = self.num_riders {
            config.num_riders = n;
        }
        if let Some(rate) = self.mean_spawn_rate {
            config.mean_spawn_rate = rate;
        }
        if let Some(bikes) = self.bikes_per_station {
            config.bikes_per_station = StationCapacity::try_from(bikes)?;
        }
        if let Some(mean) = self.ride_time_mean {
            config.ride_time_mean = mean;
        }
        if let Some(std) = self.ride_time_std {
            config.ride_time_std = std;
        }
        if let Some(end) = self.end_time {
            config.end_time = end;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_validation {
            config.validate = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn network(&self) -> Result<bikeshare_core::network::StationNetwork, Box<dyn Error>> {
        Ok(load_network(
            &self.start_station_probs_file,
            &self.trip_stats_file,
            self.unknown_stations.into(),
        )?)
    }
}

fn read_config(path: &Path) -> Result<SimulationConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

// ── Commands ───────────────────────────────────────────────────────

fn run_once(sim: &SimulationArgs, save_results: Option<&Path>) -> Result<(), Box<dyn Error>> {
    if let Some(path) = save_results {
        check_result_path(path)?;
    }
    let config = sim.config()?;
    let network = sim.network()?;
    info!(
        stations = network.station_count(),
        riders = config.num_riders,
        end_time = config.end_time,
        "loaded network"
    );

    let mut simulation = Simulation::new(config, network)?;
    let result = simulation.run();
    for (name, entry) in &result.report {
        info!(entry = %name, estimate = entry.estimate, "report");
    }
    if let Some(validation) = &result.validation {
        info!(
            max_normalized_error = validation.max_normalized_error(),
            "validation"
        );
    }

    if let Some(path) = save_results {
        save_result(result, path)?;
        info!(path = %path.display(), "saved result");
    }
    Ok(())
}

fn run_confidence(
    sim: &SimulationArgs,
    n_runs: usize,
    confidence: f64,
    threads: Option<usize>,
    show_progress: bool,
    save_results: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    if let Some(path) = save_results {
        summary_format(path)?;
    }
    let config = sim.config()?;
    let network = sim.network()?;

    let results = run_repeated(&config, &network, n_runs, threads, show_progress)?;
    let summary = summarize_report(&results, confidence)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = save_results {
        save_summary(&summary, path)?;
        info!(path = %path.display(), "saved summary");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Run { sim, save_results } => run_once(sim, save_results.as_deref()),
        Commands::Confidence {
            sim,
            n_runs,
            confidence,
            threads,
            no_progress,
            save_results,
        } => run_confidence(
            sim,
            *n_runs,
            *confidence,
            *threads,
            !no_progress,
            save_results.as_deref(),
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
