//! Station network: names, start probabilities, and the return transition matrix.
//!
//! A network is validated once on construction; the simulation never re-checks it.

use std::collections::HashSet;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::stations::StationId;

mod loader;

pub use loader::{
    load_network, read_network, read_start_probabilities, read_trip_counts, StationCatalog,
};

/// Name of the zero-probability station that absorbs trips to unknown stations.
pub const CATCH_ALL_STATION: &str = "dump";

/// Tolerance for start probabilities summing to one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// What to do with trip rows naming a station missing from the start table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStationPolicy {
    /// Route the trip to the appended [CATCH_ALL_STATION].
    #[default]
    CatchAll,
    /// Ignore the row.
    Drop,
    /// Fail the load.
    Reject,
}

/// Row-normalized destination probabilities. Row `i` is the distribution of
/// return stations for a bike taken at station `i`.
///
/// A row whose raw trip total is zero stays all-zero rather than being spread
/// uniformly; see [TransitionMatrix::row_has_mass].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Builds the matrix from raw trip counts, normalizing every row by its total.
    pub fn from_counts(counts: Vec<Vec<f64>>) -> Result<Self, NetworkError> {
        let matrix = Self::from_rows(counts)?;
        let rows = matrix
            .rows
            .into_iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    row.into_iter().map(|c| c / total).collect()
                } else {
                    row
                }
            })
            .collect();
        Ok(Self { rows })
    }

    /// Uses the rows as given. Entries must be finite, non-negative, and square.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, NetworkError> {
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(NetworkError::RowLength {
                    row: i,
                    expected: n,
                    found: row.len(),
                });
            }
            if let Some((j, &value)) = row
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(NetworkError::InvalidTransition {
                    row: i,
                    col: j,
                    value,
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, origin: StationId) -> &[f64] {
        &self.rows[origin.index()]
    }

    pub fn get(&self, origin: StationId, destination: StationId) -> f64 {
        self.rows[origin.index()][destination.index()]
    }

    /// `false` for stations with no observed outbound trips.
    pub fn row_has_mass(&self, origin: StationId) -> bool {
        self.row(origin).iter().any(|&p| p > 0.0)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

/// Everything the simulation needs to know about the stations.
#[derive(Debug, Clone, PartialEq, Resource)]
pub struct StationNetwork {
    names: Vec<String>,
    start_probabilities: Vec<f64>,
    transitions: TransitionMatrix,
}

impl StationNetwork {
    pub fn new(
        names: Vec<String>,
        start_probabilities: Vec<f64>,
        transitions: TransitionMatrix,
    ) -> Result<Self, NetworkError> {
        if names.is_empty() {
            return Err(NetworkError::Empty);
        }

        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(NetworkError::DuplicateStation(dup.clone()));
        }

        if start_probabilities.len() != names.len() {
            return Err(NetworkError::DimensionMismatch {
                stations: names.len(),
                rows: start_probabilities.len(),
            });
        }
        if transitions.dimension() != names.len() {
            return Err(NetworkError::DimensionMismatch {
                stations: names.len(),
                rows: transitions.dimension(),
            });
        }

        if let Some((station, &value)) = start_probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(NetworkError::InvalidProbability { station, value });
        }
        let sum: f64 = start_probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(NetworkError::ProbabilitySum { sum });
        }

        Ok(Self {
            names,
            start_probabilities,
            transitions,
        })
    }

    pub fn station_count(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn start_probabilities(&self) -> &[f64] {
        &self.start_probabilities
    }

    pub fn start_probability(&self, station: StationId) -> f64 {
        self.start_probabilities[station.index()]
    }

    pub fn transitions(&self) -> &TransitionMatrix {
        &self.transitions
    }

    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(StationId::from_index)
    }

    pub fn station_ids(&self) -> impl Iterator<Item = StationId> {
        (0..self.names.len()).map(StationId::from_index)
    }
}
