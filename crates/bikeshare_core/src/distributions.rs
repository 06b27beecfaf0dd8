//! Stochastic model: spawn volume, origin and destination draws, ride durations.
//!
//! Spawn volume is generated once per run. Every other draw happens when the
//! corresponding handler executes, from the same per-run RNG.

use bevy_ecs::prelude::Resource;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, LogNormal};

use crate::clock::Minute;
use crate::error::{ConfigError, NetworkError, SimulationError};
use crate::network::StationNetwork;
use crate::stations::StationId;

/// Log-space parameters of the ride-duration distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideTimeParams {
    pub mu: f64,
    pub sigma: f64,
}

/// Pre-generated arrival counts, one entry per minute of the horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub struct SpawnPlan {
    pub per_minute: Vec<u64>,
}

impl SpawnPlan {
    pub fn total(&self) -> u64 {
        self.per_minute.iter().sum()
    }
}

#[derive(Resource)]
pub struct StochasticModel {
    rng: StdRng,
    mean_spawn_rate: f64,
    origins: WeightedIndex<f64>,
    /// `None` for stations whose transition row has no mass.
    destinations: Vec<Option<WeightedIndex<f64>>>,
    ride_time: LogNormal<f64>,
}

impl StochasticModel {
    pub fn new(
        network: &StationNetwork,
        mean_spawn_rate: f64,
        ride_time: RideTimeParams,
        seed: Option<u64>,
    ) -> Result<Self, SimulationError> {
        if !mean_spawn_rate.is_finite() || mean_spawn_rate < 0.0 {
            return Err(ConfigError::InvalidSpawnRate(mean_spawn_rate).into());
        }
        let invalid_ride_time = || ConfigError::InvalidRideTime {
            mean: ride_time.mu,
            std: ride_time.sigma,
        };
        if !ride_time.mu.is_finite() || !ride_time.sigma.is_finite() {
            return Err(invalid_ride_time().into());
        }
        let ride_time_dist =
            LogNormal::new(ride_time.mu, ride_time.sigma).map_err(|_| invalid_ride_time())?;

        let origins = WeightedIndex::new(network.start_probabilities()).map_err(|_| {
            NetworkError::ProbabilitySum {
                sum: network.start_probabilities().iter().sum(),
            }
        })?;
        let destinations = network
            .transitions()
            .rows()
            .iter()
            .map(|row| WeightedIndex::new(row).ok())
            .collect();

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            rng,
            mean_spawn_rate,
            origins,
            destinations,
            ride_time: ride_time_dist,
        })
    }

    /// Arrival counts per minute: `round(Exp(scale = mean_spawn_rate))`.
    pub fn spawn_plan(&mut self, horizon: Minute) -> SpawnPlan {
        let per_minute = match Exp::new(1.0 / self.mean_spawn_rate) {
            Ok(exp) if self.mean_spawn_rate > 0.0 => (0..horizon)
                .map(|_| exp.sample(&mut self.rng).round() as u64)
                .collect(),
            _ => vec![0; horizon as usize],
        };
        SpawnPlan { per_minute }
    }

    pub fn draw_origin(&mut self) -> StationId {
        StationId::from_index(self.origins.sample(&mut self.rng))
    }

    /// Return station for a bike taken at `origin`. A bike from a station with
    /// no outbound trip mass docks back where it was taken.
    pub fn draw_destination(&mut self, origin: StationId) -> StationId {
        match self.destinations.get(origin.index()).and_then(Option::as_ref) {
            Some(weights) => StationId::from_index(weights.sample(&mut self.rng)),
            None => origin,
        }
    }

    /// Ride length in whole minutes: `round(exp(N(mu, sigma)))`.
    /// Draws too long to represent saturate at [Minute::MAX].
    pub fn draw_ride_minutes(&mut self) -> Minute {
        let minutes = self.ride_time.sample(&mut self.rng).round();
        if minutes.is_finite() && minutes < Minute::MAX as f64 {
            minutes as Minute
        } else {
            Minute::MAX
        }
    }

    pub fn mean_spawn_rate(&self) -> f64 {
        self.mean_spawn_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::TransitionMatrix;

    fn network(q: Vec<Vec<f64>>, p: Vec<f64>) -> StationNetwork {
        let names = (0..p.len()).map(|i| format!("s{i}")).collect();
        StationNetwork::new(names, p, TransitionMatrix::from_rows(q).unwrap()).unwrap()
    }

    fn model(rate: f64, seed: u64) -> StochasticModel {
        let net = network(vec![vec![0.0, 1.0], vec![0.0, 0.0]], vec![0.0, 1.0]);
        StochasticModel::new(
            &net,
            rate,
            RideTimeParams {
                mu: 2.78,
                sigma: 0.619,
            },
            Some(seed),
        )
        .expect("model")
    }

    #[test]
    fn spawn_plan_covers_horizon_and_tracks_mean() {
        let mut m = model(2.38, 7);
        let plan = m.spawn_plan(10_000);
        assert_eq!(plan.per_minute.len(), 10_000);
        let mean = plan.total() as f64 / 10_000.0;
        assert!((mean - 2.38).abs() < 0.15, "mean {mean}");
    }

    #[test]
    fn zero_rate_spawns_nobody() {
        let mut m = model(0.0, 1);
        assert_eq!(m.spawn_plan(5).per_minute, vec![0; 5]);
    }

    #[test]
    fn draws_follow_degenerate_weights() {
        let mut m = model(1.0, 3);
        for _ in 0..50 {
            assert_eq!(m.draw_origin(), StationId(1));
            assert_eq!(m.draw_destination(StationId(0)), StationId(1));
        }
    }

    #[test]
    fn empty_transition_row_docks_at_origin() {
        let mut m = model(1.0, 3);
        assert_eq!(m.draw_destination(StationId(1)), StationId(1));
    }

    #[test]
    fn same_seed_gives_same_draws() {
        let mut a = model(2.0, 99);
        let mut b = model(2.0, 99);
        assert_eq!(a.spawn_plan(100), b.spawn_plan(100));
        let rides_a: Vec<_> = (0..20).map(|_| a.draw_ride_minutes()).collect();
        let rides_b: Vec<_> = (0..20).map(|_| b.draw_ride_minutes()).collect();
        assert_eq!(rides_a, rides_b);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let net = network(vec![vec![1.0]], vec![1.0]);
        let params = RideTimeParams { mu: 1.0, sigma: 0.5 };
        assert!(matches!(
            StochasticModel::new(&net, -1.0, params, None),
            Err(SimulationError::Config(ConfigError::InvalidSpawnRate(_)))
        ));
        let bad = RideTimeParams {
            mu: f64::NAN,
            sigma: 0.5,
        };
        assert!(matches!(
            StochasticModel::new(&net, 1.0, bad, None),
            Err(SimulationError::Config(ConfigError::InvalidRideTime { .. }))
        ));
    }

    #[test]
    fn oversized_ride_draws_saturate() {
        let net = network(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![0.5, 0.5]);
        let ride = RideTimeParams {
            mu: 50.0,
            sigma: 0.0,
        };
        let mut m = StochasticModel::new(&net, 1.0, ride, Some(1)).expect("model");
        assert_eq!(m.draw_ride_minutes(), Minute::MAX);
    }
}
