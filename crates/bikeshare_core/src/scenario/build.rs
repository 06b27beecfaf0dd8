use bevy_ecs::prelude::World;
use tracing::debug;

use crate::clock::SimulationClock;
use crate::distributions::{SpawnPlan, StochasticModel};
use crate::error::SimulationError;
use crate::network::StationNetwork;
use crate::scenario::params::SimulationConfig;
use crate::stations::{FleetLedger, RiderTally, StationInventory};
use crate::systems::HandlerOutcome;
use crate::telemetry::InvocationStats;

/// Inserts every resource a run needs into `world`.
///
/// The config is validated first. Nothing is scheduled here; see
/// [crate::runner::initialize_simulation].
pub fn build_simulation(
    world: &mut World,
    config: &SimulationConfig,
    network: &StationNetwork,
) -> Result<(), SimulationError> {
    config.validate()?;
    let model = StochasticModel::new(
        network,
        config.mean_spawn_rate,
        config.ride_time(),
        config.seed,
    )?;

    let capacity = config.bikes_per_station;
    world.insert_resource(SimulationClock::new(config.end_time));
    world.insert_resource(StationInventory::new(network.names().iter().cloned(), capacity));
    world.insert_resource(FleetLedger::new(network.station_count(), capacity));
    world.insert_resource(RiderTally::new(config.num_riders));
    world.insert_resource(model);
    world.insert_resource(SpawnPlan::default());
    world.insert_resource(InvocationStats::default());
    world.insert_resource(HandlerOutcome::default());
    world.insert_resource(config.clone());
    world.insert_resource(network.clone());

    debug!(
        stations = network.station_count(),
        horizon = config.end_time,
        cap = config.num_riders,
        seed = ?config.seed,
        "built simulation world"
    );
    Ok(())
}
