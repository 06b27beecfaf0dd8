//! Station state: bike inventory, waiting riders, and fleet bookkeeping.
//!
//! Stations live in a dense vector indexed by [StationId]. Handlers are the only
//! writers; nothing here schedules events or draws random numbers.

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Index of a station in the network (`0..m`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl StationId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initial bikes per station. Serialized as a signed integer where `-1` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum StationCapacity {
    Finite(u32),
    Unbounded,
}

impl Default for StationCapacity {
    fn default() -> Self {
        Self::Finite(10)
    }
}

impl TryFrom<i64> for StationCapacity {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unbounded),
            v if v >= 0 && v <= u32::MAX as i64 => Ok(Self::Finite(v as u32)),
            v => Err(ConfigError::InvalidCapacity(v)),
        }
    }
}

impl From<StationCapacity> for i64 {
    fn from(capacity: StationCapacity) -> Self {
        match capacity {
            StationCapacity::Finite(n) => n as i64,
            StationCapacity::Unbounded => -1,
        }
    }
}

/// Bikes currently docked at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stock {
    Finite(u32),
    Unbounded,
}

impl Stock {
    pub fn is_available(&self) -> bool {
        match self {
            Self::Finite(n) => *n > 0,
            Self::Unbounded => true,
        }
    }

    /// Removes one bike. Returns `false` (and leaves the stock untouched) when empty.
    pub fn take(&mut self) -> bool {
        match self {
            Self::Finite(0) => false,
            Self::Finite(n) => {
                *n -= 1;
                true
            }
            Self::Unbounded => true,
        }
    }

    pub fn dock(&mut self) {
        if let Self::Finite(n) = self {
            *n += 1;
        }
    }

    /// Docked bike count, `None` when unbounded.
    pub fn count(&self) -> Option<u32> {
        match self {
            Self::Finite(n) => Some(*n),
            Self::Unbounded => None,
        }
    }
}

impl From<StationCapacity> for Stock {
    fn from(capacity: StationCapacity) -> Self {
        match capacity {
            StationCapacity::Finite(n) => Self::Finite(n),
            StationCapacity::Unbounded => Self::Unbounded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    pub name: String,
    pub bikes: Stock,
    /// Riders currently queued for a bike here.
    pub waiting: u32,
    /// Riders that spawned at this station.
    pub arrivals: u64,
    /// Bikes taken from this station.
    pub departures: u64,
}

/// Serializable view of one station at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSnapshot {
    pub name: String,
    /// `None` for unbounded stations.
    pub bikes: Option<u32>,
    pub waiting: u32,
    pub arrivals: u64,
    pub departures: u64,
}

impl From<&Station> for StationSnapshot {
    fn from(station: &Station) -> Self {
        Self {
            name: station.name.clone(),
            bikes: station.bikes.count(),
            waiting: station.waiting,
            arrivals: station.arrivals,
            departures: station.departures,
        }
    }
}

/// All stations of the network, indexed by [StationId].
#[derive(Debug, Clone, Resource)]
pub struct StationInventory {
    stations: Vec<Station>,
}

impl StationInventory {
    pub fn new<I, S>(names: I, capacity: StationCapacity) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stations = names
            .into_iter()
            .map(|name| Station {
                name: name.into(),
                bikes: capacity.into(),
                waiting: 0,
                arrivals: 0,
                departures: 0,
            })
            .collect();
        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    pub fn get_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.stations.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.stations
            .iter()
            .enumerate()
            .map(|(i, s)| (StationId::from_index(i), s))
    }

    /// Sum of docked bikes, `None` if any station is unbounded.
    pub fn docked_bikes(&self) -> Option<u64> {
        self.stations
            .iter()
            .map(|s| s.bikes.count().map(u64::from))
            .sum()
    }

    pub fn waiting_riders(&self) -> u64 {
        self.stations.iter().map(|s| u64::from(s.waiting)).sum()
    }

    pub fn snapshot(&self) -> Vec<StationSnapshot> {
        self.stations.iter().map(StationSnapshot::from).collect()
    }
}

/// Bikes in circulation: taken but not yet returned.
#[derive(Debug, Clone, Default, Resource)]
pub struct FleetLedger {
    /// Total fleet size, `None` in unbounded mode.
    initial_fleet: Option<u64>,
    in_transit: u64,
    trips_started: u64,
    trips_completed: u64,
}

impl FleetLedger {
    pub fn new(station_count: usize, capacity: StationCapacity) -> Self {
        let initial_fleet = match capacity {
            StationCapacity::Finite(n) => Some(station_count as u64 * u64::from(n)),
            StationCapacity::Unbounded => None,
        };
        Self {
            initial_fleet,
            ..Default::default()
        }
    }

    pub fn depart(&mut self) {
        self.in_transit += 1;
        self.trips_started += 1;
    }

    pub fn arrive(&mut self) {
        self.in_transit = self.in_transit.saturating_sub(1);
        self.trips_completed += 1;
    }

    pub fn in_transit(&self) -> u64 {
        self.in_transit
    }

    pub fn trips_started(&self) -> u64 {
        self.trips_started
    }

    pub fn trips_completed(&self) -> u64 {
        self.trips_completed
    }

    pub fn initial_fleet(&self) -> Option<u64> {
        self.initial_fleet
    }

    /// Finite fleets: docked + in transit equals the initial fleet.
    /// Unbounded fleets have no total to conserve, so only the trip ledger is checked.
    pub fn conservation_holds(&self, inventory: &StationInventory) -> bool {
        let ledger_balanced = self.trips_started == self.trips_completed + self.in_transit;
        match (self.initial_fleet, inventory.docked_bikes()) {
            (Some(fleet), Some(docked)) => ledger_balanced && docked + self.in_transit == fleet,
            (None, _) => ledger_balanced,
            (Some(_), None) => false,
        }
    }
}

/// Spawned-rider counter bounded by the configured cap.
#[derive(Debug, Clone, Copy, Resource)]
pub struct RiderTally {
    cap: u64,
    spawned: u64,
}

impl RiderTally {
    pub fn new(cap: u64) -> Self {
        Self { cap, spawned: 0 }
    }

    /// Counts one more rider unless the cap is reached.
    pub fn try_admit(&mut self) -> bool {
        if self.spawned < self.cap {
            self.spawned += 1;
            true
        } else {
            false
        }
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }
}
