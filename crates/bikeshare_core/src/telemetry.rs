//! Invocation statistics: the instrumentation wrapped around every handler dispatch.
//!
//! Recording is driven by [Event::visit_args], so one code path covers every
//! handler kind without naming any handler's fields.

use std::collections::BTreeMap;
use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::clock::{Event, EventKind};
use crate::stations::StationId;

/// What a handler invocation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// A station index: the origin of a spawned rider or the destination of a returned bike.
    Station(StationId),
    /// Spawn suppressed by the rider cap.
    Limited,
    /// A bike was available; a take was scheduled.
    Take,
    /// No bike; the rider retries next minute.
    Wait,
    /// The bike vanished between wait and take; the rider waits again.
    Requeued,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Station(id) => write!(f, "{id}"),
            Outcome::Limited => f.write_str("Limited"),
            Outcome::Take => f.write_str("Take"),
            Outcome::Wait => f.write_str("Wait"),
            Outcome::Requeued => f.write_str("Requeued"),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts per station index, stored densely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    pub fn add(&mut self, value: StationId, n: u64) {
        let idx = value.index();
        if idx >= self.counts.len() {
            self.counts.resize(idx + 1, 0);
        }
        self.counts[idx] += n;
    }

    pub fn get(&self, value: StationId) -> u64 {
        self.counts.get(value.index()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Non-zero entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (StationId, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(i, &c)| (StationId::from_index(i), c))
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (station, count) in self.iter() {
            map.serialize_entry(&station.0, &count)?;
        }
        map.end()
    }
}

/// Call count plus a value histogram per argument name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallTally {
    pub total: u64,
    pub args: BTreeMap<&'static str, Histogram>,
}

impl CallTally {
    fn record(&mut self, event: &Event, times: u64) {
        self.total += times;
        event.visit_args(|name, value| self.args.entry(name).or_default().add(value, times));
    }

    pub fn arg(&self, name: &str) -> Option<&Histogram> {
        self.args.get(name)
    }

    /// How often argument `name` took `value`.
    pub fn arg_count(&self, name: &str, value: StationId) -> u64 {
        self.arg(name).map_or(0, |h| h.get(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerStats {
    #[serde(flatten)]
    pub calls: CallTally,
    pub ret_vals: BTreeMap<Outcome, u64>,
    /// Invocations scheduled at or past the horizon. They never executed.
    pub overtime: CallTally,
}

impl HandlerStats {
    pub fn total(&self) -> u64 {
        self.calls.total
    }

    pub fn ret_val(&self, outcome: Outcome) -> u64 {
        self.ret_vals.get(&outcome).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub struct InvocationStats {
    handlers: [HandlerStats; EventKind::COUNT],
}

impl InvocationStats {
    /// Records one executed invocation and its outcome.
    pub fn record_call(&mut self, event: &Event, outcome: Option<Outcome>) {
        let stats = &mut self.handlers[event.kind().slot()];
        stats.calls.record(event, 1);
        if let Some(outcome) = outcome {
            *stats.ret_vals.entry(outcome).or_insert(0) += 1;
        }
    }

    /// Records `times` invocations rejected by the horizon.
    pub fn record_overtime(&mut self, event: &Event, times: u64) {
        self.handlers[event.kind().slot()]
            .overtime
            .record(event, times);
    }

    pub fn handler(&self, kind: EventKind) -> &HandlerStats {
        &self.handlers[kind.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventKind, &HandlerStats)> {
        EventKind::ALL.into_iter().map(|kind| (kind, self.handler(kind)))
    }
}

impl Serialize for InvocationStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.handlers.len()))?;
        for (kind, stats) in self.iter() {
            map.serialize_entry(kind.name(), stats)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_outcomes_and_arguments_are_tallied() {
        let mut stats = InvocationStats::default();
        let wait = Event::WaitForBike {
            station: StationId(2),
        };
        stats.record_call(&wait, Some(Outcome::Wait));
        stats.record_call(&wait, Some(Outcome::Take));
        stats.record_call(&Event::SpawnRider, Some(Outcome::Limited));

        let waits = stats.handler(EventKind::WaitForBike);
        assert_eq!(waits.total(), 2);
        assert_eq!(waits.calls.arg_count("station", StationId(2)), 2);
        assert_eq!(waits.ret_val(Outcome::Wait), 1);
        assert_eq!(waits.ret_val(Outcome::Take), 1);

        let spawns = stats.handler(EventKind::SpawnRider);
        assert_eq!(spawns.total(), 1);
        assert!(spawns.calls.args.is_empty());
    }

    #[test]
    fn overtime_is_kept_apart_from_executed_calls() {
        let mut stats = InvocationStats::default();
        let ret = Event::ReturnBike {
            origin: StationId(1),
        };
        stats.record_overtime(&ret, 3);

        let returns = stats.handler(EventKind::ReturnBike);
        assert_eq!(returns.total(), 0);
        assert!(returns.ret_vals.is_empty());
        assert_eq!(returns.overtime.total, 3);
        assert_eq!(returns.overtime.arg_count("origin", StationId(1)), 3);
    }

    #[test]
    fn histogram_skips_empty_slots() {
        let mut h = Histogram::default();
        h.add(StationId(3), 2);
        h.add(StationId(0), 1);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![(StationId(0), 1), (StationId(3), 2)]);
        assert_eq!(h.total(), 3);
        assert_eq!(h.get(StationId(9)), 0);
    }

    #[test]
    fn outcome_display_matches_document_keys() {
        assert_eq!(Outcome::Station(StationId(5)).to_string(), "5");
        assert_eq!(Outcome::Limited.to_string(), "Limited");
    }
}
