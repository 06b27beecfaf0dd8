use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::Minute;
use crate::distributions::RideTimeParams;
use crate::error::ConfigError;
use crate::stations::StationCapacity;

/// Default rider cap for one run.
const DEFAULT_NUM_RIDERS: u64 = 3500;
/// Default mean arrivals per minute.
const DEFAULT_MEAN_SPAWN_RATE: f64 = 2.38;
/// Default log-space mean of the ride duration (about 16 minutes median).
const DEFAULT_RIDE_TIME_MEAN: f64 = 2.78;
const DEFAULT_RIDE_TIME_STD: f64 = 0.619;
/// One day.
const DEFAULT_END_TIME: Minute = 24 * 60;

/// Parameters of one simulation run.
///
/// Every field has a default, so a partial JSON document deserializes into a
/// full config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum number of riders spawned over the whole run.
    pub num_riders: u64,
    /// Mean of the exponential per-minute arrival count.
    pub mean_spawn_rate: f64,
    /// Bikes docked at every station at minute 0. `-1` in serialized form means unbounded.
    pub bikes_per_station: StationCapacity,
    /// Log-space mean of the ride duration in minutes.
    pub ride_time_mean: f64,
    /// Log-space standard deviation of the ride duration.
    pub ride_time_std: f64,
    /// Horizon in minutes. Events at or past it are tallied as overtime and never run.
    pub end_time: Minute,
    /// Seed for the run's RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Run the post-pass comparison against closed-form expectations.
    pub validate: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_riders: DEFAULT_NUM_RIDERS,
            mean_spawn_rate: DEFAULT_MEAN_SPAWN_RATE,
            bikes_per_station: StationCapacity::default(),
            ride_time_mean: DEFAULT_RIDE_TIME_MEAN,
            ride_time_std: DEFAULT_RIDE_TIME_STD,
            end_time: DEFAULT_END_TIME,
            seed: None,
            validate: true,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_num_riders(mut self, num_riders: u64) -> Self {
        self.num_riders = num_riders;
        self
    }

    pub fn with_mean_spawn_rate(mut self, rate: f64) -> Self {
        self.mean_spawn_rate = rate;
        self
    }

    pub fn with_bikes_per_station(mut self, capacity: StationCapacity) -> Self {
        self.bikes_per_station = capacity;
        self
    }

    /// Set the log-space mean and standard deviation of the ride duration.
    pub fn with_ride_time(mut self, mean: f64, std: f64) -> Self {
        self.ride_time_mean = mean;
        self.ride_time_std = std;
        self
    }

    pub fn with_end_time(mut self, end_time: Minute) -> Self {
        self.end_time = end_time;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn ride_time(&self) -> RideTimeParams {
        RideTimeParams {
            mu: self.ride_time_mean,
            sigma: self.ride_time_std,
        }
    }

    /// Riders the arrival process is expected to produce over the horizon, before the cap.
    pub fn expected_arrivals(&self) -> f64 {
        self.mean_spawn_rate * self.end_time as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mean_spawn_rate.is_finite() || self.mean_spawn_rate < 0.0 {
            return Err(ConfigError::InvalidSpawnRate(self.mean_spawn_rate));
        }
        if !self.ride_time_mean.is_finite()
            || !self.ride_time_std.is_finite()
            || self.ride_time_std < 0.0
        {
            return Err(ConfigError::InvalidRideTime {
                mean: self.ride_time_mean,
                std: self.ride_time_std,
            });
        }
        if self.end_time == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        Ok(())
    }
}
