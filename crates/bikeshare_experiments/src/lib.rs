//! Repeated-run driver for the bike-share simulation.
//!
//! Runs the same configuration many times in parallel with offset seeds,
//! summarizes every report entry with a Student-t confidence interval, and
//! exports single results or summaries to disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use bikeshare_core::network::{load_network, UnknownStationPolicy};
//! use bikeshare_core::scenario::SimulationConfig;
//! use bikeshare_experiments::{run_repeated, summarize_report};
//! use std::path::Path;
//!
//! let network = load_network(
//!     Path::new("data/start_station_probs.csv"),
//!     Path::new("data/trip_stats.csv"),
//!     UnknownStationPolicy::CatchAll,
//! )?;
//! let config = SimulationConfig::default().with_seed(42);
//!
//! let results = run_repeated(&config, &network, 10, None, true)?;
//! let summary = summarize_report(&results, 0.9)?;
//! println!("{:?}", summary["trips_started"].confidence_interval);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - [`runner`]: Parallel simulation execution using rayon
//! - [`confidence`]: Per-entry mean, spread and confidence interval
//! - [`export`]: Result export to JSON and CSV

pub mod confidence;
pub mod error;
pub mod export;
pub mod runner;

pub use confidence::{summarize, summarize_report, ConfidenceSummary, EstimateSummary};
pub use error::{ExperimentError, ExportError};
pub use export::{
    check_result_path, export_result_to_json, export_results_to_json, export_summary_to_csv,
    export_summary_to_json, save_result, save_summary, summary_format, ExportFormat,
};
pub use runner::{config_for_run, run_repeated, run_single_simulation};
