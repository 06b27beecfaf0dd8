//! Errors raised by the multi-run driver and the exporters.

use bikeshare_core::error::{LoadError, SimulationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("confidence intervals need at least two runs, got {0}")]
    TooFewRuns(usize),

    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    #[error("student-t distribution: {0}")]
    Distribution(#[from] statrs::StatsError),

    #[error("report entry {name:?} is missing from run {run}")]
    MissingEntry { name: String, run: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no results to export")]
    Empty,

    #[error("unsupported output format for {path}, expected {expected}")]
    UnsupportedFormat {
        path: std::path::PathBuf,
        expected: &'static str,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
