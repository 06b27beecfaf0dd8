//! Post-run check of the handler outcome histograms against closed-form expectations.
//!
//! Spawns: each admitted rider picks origin `i` with probability `p[i]`, and the
//! cap suppresses whatever the arrival process produces beyond it. Returns: every
//! bike taken at `i` whose return fell inside the horizon lands at `j` with
//! probability `q[i][j]`.

use std::collections::BTreeMap;

use bevy_ecs::prelude::World;
use serde::Serialize;

use crate::clock::EventKind;
use crate::network::StationNetwork;
use crate::scenario::SimulationConfig;
use crate::stations::{RiderTally, StationId};
use crate::telemetry::{InvocationStats, Outcome};

/// Expected versus simulated outcome counts of one handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeComparison {
    pub expected: BTreeMap<Outcome, f64>,
    pub simulated: BTreeMap<Outcome, u64>,
    /// `simulated - expected` for every expected key.
    pub error: BTreeMap<Outcome, f64>,
}

impl OutcomeComparison {
    pub fn new(expected: BTreeMap<Outcome, f64>, simulated: BTreeMap<Outcome, u64>) -> Self {
        let error = expected
            .iter()
            .map(|(&key, &exp)| {
                let sim = simulated.get(&key).copied().unwrap_or(0);
                (key, sim as f64 - exp)
            })
            .collect();
        Self {
            expected,
            simulated,
            error,
        }
    }

    /// `|error| / sqrt(expected)`, with the denominator floored at one so that
    /// keys expected to be (nearly) empty are judged on their absolute error.
    pub fn normalized_error(&self, key: Outcome) -> Option<f64> {
        let error = self.error.get(&key)?;
        let expected = self.expected.get(&key).copied().unwrap_or(0.0);
        Some(error.abs() / expected.max(1.0).sqrt())
    }

    pub fn max_normalized_error(&self) -> f64 {
        self.error
            .keys()
            .filter_map(|&key| self.normalized_error(key))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// SpawnRider outcomes: origin stations plus `Limited`.
    pub spawn_stations: OutcomeComparison,
    /// ReturnBike outcomes: destination stations.
    pub return_bike: OutcomeComparison,
}

impl ValidationReport {
    pub fn max_normalized_error(&self) -> f64 {
        self.spawn_stations
            .max_normalized_error()
            .max(self.return_bike.max_normalized_error())
    }
}

/// Compares the recorded invocations of a finished run with their expectations.
pub fn validate_invocations(
    stats: &InvocationStats,
    network: &StationNetwork,
    config: &SimulationConfig,
    total_spawned: u64,
) -> ValidationReport {
    ValidationReport {
        spawn_stations: compare_spawns(stats, network, config, total_spawned),
        return_bike: compare_returns(stats, network),
    }
}

/// [validate_invocations] against the resources of a finished world.
///
/// # Panics
///
/// Panics if `world` was not built with [crate::scenario::build_simulation].
pub fn validate(world: &World) -> ValidationReport {
    validate_invocations(
        world.resource::<InvocationStats>(),
        world.resource::<StationNetwork>(),
        world.resource::<SimulationConfig>(),
        world.resource::<RiderTally>().spawned(),
    )
}

fn compare_spawns(
    stats: &InvocationStats,
    network: &StationNetwork,
    config: &SimulationConfig,
    total_spawned: u64,
) -> OutcomeComparison {
    let mut expected: BTreeMap<Outcome, f64> = network
        .station_ids()
        .map(|i| {
            (
                Outcome::Station(i),
                network.start_probability(i) * total_spawned as f64,
            )
        })
        .collect();
    let limited = (config.expected_arrivals() - config.num_riders as f64).max(0.0);
    expected.insert(Outcome::Limited, limited);

    let simulated = stats.handler(EventKind::SpawnRider).ret_vals.clone();
    OutcomeComparison::new(expected, simulated)
}

fn compare_returns(stats: &InvocationStats, network: &StationNetwork) -> OutcomeComparison {
    let takes = &stats.handler(EventKind::TakeBike).calls;
    let late_returns = &stats.handler(EventKind::ReturnBike).overtime;
    let q = network.transitions();

    let mut expected: BTreeMap<Outcome, f64> = network
        .station_ids()
        .map(|j| (Outcome::Station(j), 0.0))
        .collect();
    for i in network.station_ids() {
        let returned = takes
            .arg_count("station", i)
            .saturating_sub(late_returns.arg_count("origin", i)) as f64;
        if returned == 0.0 {
            continue;
        }
        if q.row_has_mass(i) {
            for (j, &p) in q.row(i).iter().enumerate() {
                *expected
                    .entry(Outcome::Station(StationId::from_index(j)))
                    .or_insert(0.0) += p * returned;
            }
        } else {
            *expected.entry(Outcome::Station(i)).or_insert(0.0) += returned;
        }
    }

    let simulated = stats.handler(EventKind::ReturnBike).ret_vals.clone();
    OutcomeComparison::new(expected, simulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Event;
    use crate::test_helpers::{network_from, tiny_config};

    fn record(stats: &mut InvocationStats, event: Event, outcome: Option<Outcome>, n: usize) {
        for _ in 0..n {
            stats.record_call(&event, outcome);
        }
    }

    #[test]
    fn spawn_expectation_follows_start_probabilities_and_cap() {
        let network = network_from(
            &["a", "b"],
            vec![0.25, 0.75],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        );
        // 100 minutes at 2.38 per minute against a cap of 200.
        let config = tiny_config(0).with_num_riders(200).with_mean_spawn_rate(2.38);
        let mut stats = InvocationStats::default();
        record(&mut stats, Event::SpawnRider, Some(Outcome::Station(StationId(0))), 50);
        record(&mut stats, Event::SpawnRider, Some(Outcome::Station(StationId(1))), 150);
        record(&mut stats, Event::SpawnRider, Some(Outcome::Limited), 40);

        let report = validate_invocations(&stats, &network, &config, 200);
        let spawns = &report.spawn_stations;
        assert_eq!(spawns.expected[&Outcome::Station(StationId(0))], 50.0);
        assert_eq!(spawns.expected[&Outcome::Station(StationId(1))], 150.0);
        assert!((spawns.expected[&Outcome::Limited] - 38.0).abs() < 1e-9);
        assert!((spawns.error[&Outcome::Limited] - 2.0).abs() < 1e-9);
        assert_eq!(spawns.error[&Outcome::Station(StationId(0))], 0.0);
    }

    #[test]
    fn return_expectation_excludes_rides_past_the_horizon() {
        let network = network_from(
            &["a", "b", "c"],
            vec![1.0, 0.0, 0.0],
            vec![
                vec![0.0, 0.5, 0.5],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
        );
        let mut stats = InvocationStats::default();
        let take_a = Event::TakeBike {
            station: StationId(0),
        };
        let take_b = Event::TakeBike {
            station: StationId(1),
        };
        record(&mut stats, take_a, None, 10);
        record(&mut stats, take_b, None, 3);
        stats.record_overtime(
            &Event::ReturnBike {
                origin: StationId(0),
            },
            2,
        );
        let ret_a = Event::ReturnBike {
            origin: StationId(0),
        };
        record(&mut stats, ret_a, Some(Outcome::Station(StationId(1))), 5);
        record(&mut stats, ret_a, Some(Outcome::Station(StationId(2))), 3);

        let report = validate_invocations(&stats, &network, &tiny_config(0), 0);
        let returns = &report.return_bike;
        assert_eq!(returns.expected[&Outcome::Station(StationId(1))], 4.0 + 3.0);
        assert_eq!(returns.expected[&Outcome::Station(StationId(2))], 4.0);
        assert_eq!(returns.expected[&Outcome::Station(StationId(0))], 0.0);
        assert_eq!(returns.error[&Outcome::Station(StationId(1))], -2.0);
        assert_eq!(returns.error[&Outcome::Station(StationId(2))], -1.0);
    }

    #[test]
    fn normalized_error_scales_by_expected_count() {
        let comparison = OutcomeComparison::new(
            BTreeMap::from([(Outcome::Take, 100.0), (Outcome::Wait, 0.0)]),
            BTreeMap::from([(Outcome::Take, 110), (Outcome::Wait, 2)]),
        );
        assert_eq!(comparison.normalized_error(Outcome::Take), Some(1.0));
        assert_eq!(comparison.normalized_error(Outcome::Wait), Some(2.0));
        assert_eq!(comparison.normalized_error(Outcome::Limited), None);
        assert_eq!(comparison.max_normalized_error(), 2.0);
    }
}
