use bevy_ecs::prelude::World;
use bikeshare_core::clock::Minute;
use bikeshare_core::network::StationNetwork;
use bikeshare_core::scenario::{build_simulation, SimulationConfig};
use bikeshare_core::stations::StationCapacity;
use bikeshare_core::test_helpers::two_station_network;

/// Helper that builds a simulation world from a reproducible config.
#[derive(Debug)]
pub struct TestWorldBuilder {
    config: SimulationConfig,
    network: StationNetwork,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default().with_seed(42),
            network: two_station_network(),
        }
    }
}

impl TestWorldBuilder {
    /// Create a new builder: two crossing stations, default config, seed 42.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn with_network(mut self, network: StationNetwork) -> Self {
        self.network = network;
        self
    }

    pub fn with_capacity(mut self, capacity: StationCapacity) -> Self {
        self.config = self.config.with_bikes_per_station(capacity);
        self
    }

    pub fn with_rider_cap(mut self, cap: u64) -> Self {
        self.config = self.config.with_num_riders(cap);
        self
    }

    pub fn with_horizon(mut self, end_time: Minute) -> Self {
        self.config = self.config.with_end_time(end_time);
        self
    }

    /// Fixed ride length: `round(exp(mu))` minutes.
    pub fn with_fixed_ride(mut self, mu: f64) -> Self {
        self.config = self.config.with_ride_time(mu, 0.0);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Build the world with every simulation resource inserted and nothing scheduled.
    pub fn build(self) -> World {
        let mut world = World::new();
        build_simulation(&mut world, &self.config, &self.network).expect("test world");
        world
    }
}
