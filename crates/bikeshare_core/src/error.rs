//! Error types for loading inputs, validating configuration, and building a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading station and trip tables.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    /// A row has fewer fields than the table requires.
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MissingField {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A field could not be parsed into the expected type.
    #[error("line {line}: invalid {field} {value:?}")]
    InvalidValue {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// The trip table names a station that is not in the start table.
    #[error("line {line}: unknown station {name:?}")]
    UnknownStation { line: u64, name: String },

    /// The tables parsed but do not form a consistent network.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Structural problems with a station network.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("network has no stations")]
    Empty,

    #[error("station {0:?} is listed more than once")]
    DuplicateStation(String),

    #[error("{stations} stations but transition matrix has {rows} rows")]
    DimensionMismatch { stations: usize, rows: usize },

    #[error("transition row {row} has {found} entries, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("station {station}: start probability {value} is not a finite non-negative number")]
    InvalidProbability { station: usize, value: f64 },

    #[error("start probabilities sum to {sum}, expected 1")]
    ProbabilitySum { sum: f64 },

    #[error("transition entry ({row}, {col}) = {value} is not a finite non-negative number")]
    InvalidTransition { row: usize, col: usize, value: f64 },
}

/// Rejected simulation parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("mean spawn rate must be finite and non-negative, got {0}")]
    InvalidSpawnRate(f64),

    #[error("ride time parameters must be finite with a non-negative std, got mean={mean} std={std}")]
    InvalidRideTime { mean: f64, std: f64 },

    #[error("end time must be at least one minute")]
    ZeroHorizon,

    #[error("bikes per station must be -1 (unbounded) or non-negative, got {0}")]
    InvalidCapacity(i64),

    #[error("spawn plan covers {found} minutes, horizon is {horizon}")]
    SpawnPlanLength { found: usize, horizon: u64 },
}

/// Errors raised while assembling a simulation from a config and a network.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
