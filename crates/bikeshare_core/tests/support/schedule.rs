use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use bikeshare_core::clock::{Minute, ScheduledEvent};
use bikeshare_core::runner::{
    drain_bucket, run_next_event, run_until_horizon, run_until_horizon_with_hook,
    simulation_schedule,
};

/// Helper that owns a reusable `Schedule` so tests can step, drain a minute, or run to the horizon.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    /// Create a runner with the default simulation schedule.
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    /// Run a single event of minute `at`, returning it if one was pending.
    pub fn run_one(&mut self, world: &mut World, at: Minute) -> Option<ScheduledEvent> {
        run_next_event(world, &mut self.schedule, at)
    }

    /// Drain minute `at`, returning the number of events handled.
    pub fn drain(&mut self, world: &mut World, at: Minute) -> u64 {
        drain_bucket(world, &mut self.schedule, at)
    }

    /// Drive the simulation until the horizon.
    pub fn run_full(&mut self, world: &mut World) -> u64 {
        run_until_horizon(world, &mut self.schedule)
    }

    /// Drive the simulation until the horizon, calling `hook` after every event.
    pub fn run_full_with_hook<F>(&mut self, world: &mut World, hook: F) -> u64
    where
        F: FnMut(&World, &ScheduledEvent),
    {
        run_until_horizon_with_hook(world, &mut self.schedule, hook)
    }
}
