//! Test helpers for common test setup and utilities.
//!
//! Small hand-built networks and pre-built worlds shared by unit tests,
//! integration tests and benchmarks.

use bevy_ecs::prelude::World;

use crate::clock::{CurrentEvent, Event, Minute, Priority, ScheduledEvent};
use crate::network::{StationNetwork, TransitionMatrix};
use crate::scenario::{build_simulation, SimulationConfig};
use crate::stations::StationCapacity;

/// Two stations, `west` and `east`, equally likely origins, every trip crosses over.
///
/// # Panics
///
/// Panics if the hard-coded network is invalid (should never happen).
pub fn two_station_network() -> StationNetwork {
    network_from(
        &["west", "east"],
        vec![0.5, 0.5],
        vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    )
}

/// `m` stations with uniform start probabilities and uniform transitions.
///
/// # Panics
///
/// Panics if `m` is zero.
pub fn uniform_network(m: usize) -> StationNetwork {
    assert!(m > 0, "uniform network needs at least one station");
    let names: Vec<String> = (0..m).map(|i| format!("station-{i}")).collect();
    let p = 1.0 / m as f64;
    StationNetwork::new(
        names,
        vec![p; m],
        TransitionMatrix::from_rows(vec![vec![p; m]; m]).expect("uniform rows"),
    )
    .expect("uniform network")
}

/// Builds a network from literal parts.
///
/// # Panics
///
/// Panics if the parts do not form a valid network.
pub fn network_from(names: &[&str], start: Vec<f64>, rows: Vec<Vec<f64>>) -> StationNetwork {
    StationNetwork::new(
        names.iter().map(|n| n.to_string()).collect(),
        start,
        TransitionMatrix::from_rows(rows).expect("transition rows"),
    )
    .expect("network")
}

/// Config for the small deterministic scenario: 1 bike per station, cap 1, horizon 100.
pub fn tiny_config(seed: u64) -> SimulationConfig {
    SimulationConfig::default()
        .with_num_riders(1)
        .with_bikes_per_station(StationCapacity::Finite(1))
        .with_end_time(100)
        .with_seed(seed)
}

/// A world with all simulation resources inserted and nothing scheduled.
///
/// # Panics
///
/// Panics if the config or network is rejected.
pub fn create_test_world(config: &SimulationConfig, network: &StationNetwork) -> World {
    let mut world = World::new();
    build_simulation(&mut world, config, network).expect("test world");
    world
}

/// Marks `event` at minute `at` as the event being handled, for driving one system directly.
pub fn set_current_event(world: &mut World, at: Minute, event: Event, priority: Priority) {
    world.insert_resource(CurrentEvent(ScheduledEvent {
        at,
        event,
        priority,
    }));
}
