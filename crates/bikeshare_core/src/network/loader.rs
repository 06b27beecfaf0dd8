//! CSV loading for the station and trip tables.
//!
//! Station table: header, then `(name, probability)`.
//! Trip table: header, then `(origin, destination, count, ...)`; trailing fields are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use super::{StationNetwork, TransitionMatrix, UnknownStationPolicy, CATCH_ALL_STATION};
use crate::error::LoadError;
use crate::stations::StationId;

/// Station names and start probabilities in file order, before the trip table is read.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    names: Vec<String>,
    probabilities: Vec<f64>,
    index: HashMap<String, StationId>,
}

impl StationCatalog {
    pub fn push(&mut self, name: impl Into<String>, probability: f64) -> StationId {
        let name = name.into();
        let id = StationId::from_index(self.names.len());
        self.index.entry(name.clone()).or_insert(id);
        self.names.push(name);
        self.probabilities.push(probability);
        id
    }

    /// Appends the zero-probability catch-all station.
    pub fn with_catch_all(mut self) -> Self {
        self.push(CATCH_ALL_STATION, 0.0);
        self
    }

    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn require_fields(record: &StringRecord, expected: usize) -> Result<(), LoadError> {
    if record.len() < expected {
        return Err(LoadError::MissingField {
            line: line_of(record),
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

fn non_empty<'r>(
    record: &'r StringRecord,
    idx: usize,
    field: &'static str,
) -> Result<&'r str, LoadError> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        other => Err(LoadError::InvalidValue {
            line: line_of(record),
            field,
            value: other.unwrap_or_default().to_string(),
        }),
    }
}

/// Reads the station table into a catalog.
pub fn read_start_probabilities<R: io::Read>(reader: R) -> Result<StationCatalog, LoadError> {
    let mut catalog = StationCatalog::default();
    for record in csv_reader(reader).records() {
        let record = record?;
        require_fields(&record, 2)?;
        let name = non_empty(&record, 0, "station name")?;
        let raw = non_empty(&record, 1, "probability")?;
        let probability: f64 = raw.parse().map_err(|_| LoadError::InvalidValue {
            line: line_of(&record),
            field: "probability",
            value: raw.to_string(),
        })?;
        catalog.push(name, probability);
    }
    debug!(stations = catalog.len(), "loaded start probabilities");
    Ok(catalog)
}

/// Accumulates the trip table into raw `m × m` counts keyed by the catalog.
pub fn read_trip_counts<R: io::Read>(
    reader: R,
    catalog: &StationCatalog,
    policy: UnknownStationPolicy,
) -> Result<Vec<Vec<f64>>, LoadError> {
    let m = catalog.len();
    let mut counts = vec![vec![0.0; m]; m];
    let mut dropped = 0u64;

    for record in csv_reader(reader).records() {
        let record = record?;
        require_fields(&record, 3)?;
        let line = line_of(&record);
        let origin = non_empty(&record, 0, "origin")?;
        let destination = non_empty(&record, 1, "destination")?;
        let raw = non_empty(&record, 2, "trip count")?;
        let count: u64 = raw.parse().map_err(|_| LoadError::InvalidValue {
            line,
            field: "trip count",
            value: raw.to_string(),
        })?;

        let (Some(i), Some(j)) = (
            resolve(catalog, origin, line, policy)?,
            resolve(catalog, destination, line, policy)?,
        ) else {
            dropped += 1;
            continue;
        };
        counts[i.index()][j.index()] += count as f64;
    }

    if dropped > 0 {
        warn!(dropped, "dropped trip rows naming unknown stations");
    }
    Ok(counts)
}

/// `Ok(None)` means the row is dropped.
fn resolve(
    catalog: &StationCatalog,
    name: &str,
    line: u64,
    policy: UnknownStationPolicy,
) -> Result<Option<StationId>, LoadError> {
    if let Some(id) = catalog.station_id(name) {
        return Ok(Some(id));
    }
    let unknown = || LoadError::UnknownStation {
        line,
        name: name.to_string(),
    };
    match policy {
        UnknownStationPolicy::CatchAll => catalog
            .station_id(CATCH_ALL_STATION)
            .map(Some)
            .ok_or_else(unknown),
        UnknownStationPolicy::Drop => {
            debug!(line, station = name, "unknown station, dropping trip row");
            Ok(None)
        }
        UnknownStationPolicy::Reject => Err(unknown()),
    }
}

/// Builds a validated network from the two tables.
pub fn read_network<S: io::Read, T: io::Read>(
    start_probabilities: S,
    trip_stats: T,
    policy: UnknownStationPolicy,
) -> Result<StationNetwork, LoadError> {
    let mut catalog = read_start_probabilities(start_probabilities)?;
    if policy == UnknownStationPolicy::CatchAll {
        catalog = catalog.with_catch_all();
    }
    let counts = read_trip_counts(trip_stats, &catalog, policy)?;
    let transitions = TransitionMatrix::from_counts(counts)?;
    let StationCatalog {
        names,
        probabilities,
        ..
    } = catalog;
    Ok(StationNetwork::new(names, probabilities, transitions)?)
}

/// Opens both tables from disk and builds the network.
pub fn load_network(
    start_probabilities: &Path,
    trip_stats: &Path,
    policy: UnknownStationPolicy,
) -> Result<StationNetwork, LoadError> {
    let open = |path: &Path| {
        File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    read_network(open(start_probabilities)?, open(trip_stats)?, policy)
}
