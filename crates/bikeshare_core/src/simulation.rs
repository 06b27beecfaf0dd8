//! One simulation run from config to result document.

use std::collections::BTreeMap;

use bevy_ecs::prelude::{Schedule, World};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{EventKind, ScheduledEvent};
use crate::distributions::SpawnPlan;
use crate::error::{ConfigError, SimulationError};
use crate::network::{StationNetwork, TransitionMatrix};
use crate::runner::{
    initialize_simulation, run_until_horizon_with_hook, seed_spawn_plan, simulation_schedule,
};
use crate::scenario::{build_simulation, SimulationConfig};
use crate::stations::{FleetLedger, RiderTally, StationInventory, StationSnapshot};
use crate::telemetry::{InvocationStats, Outcome};
use crate::validation::{validate, ValidationReport};

/// A named scalar produced by a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub estimate: f64,
}

impl From<f64> for ReportEntry {
    fn from(estimate: f64) -> Self {
        Self { estimate }
    }
}

/// Immutable snapshot of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub stations: Vec<String>,
    pub start_probabilities: Vec<f64>,
    pub transition_probabilities: TransitionMatrix,
    pub total_riders: u64,
    pub invocations: InvocationStats,
    pub final_inventory: Vec<StationSnapshot>,
    pub report: BTreeMap<String, ReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

impl SimulationResult {
    /// Collects the result from a world whose run has finished.
    ///
    /// # Panics
    ///
    /// Panics if `world` was not built with [build_simulation].
    pub fn collect(world: &World) -> Self {
        let network = world.resource::<StationNetwork>();
        let config = world.resource::<SimulationConfig>();
        let inventory = world.resource::<StationInventory>();
        let invocations = world.resource::<InvocationStats>().clone();
        let total_riders = world.resource::<RiderTally>().spawned();

        let report = build_report(
            &invocations,
            inventory,
            world.resource::<FleetLedger>(),
            total_riders,
        );
        let validation = config.validate.then(|| validate(world));

        Self {
            stations: network.names().to_vec(),
            start_probabilities: network.start_probabilities().to_vec(),
            transition_probabilities: network.transitions().clone(),
            total_riders,
            invocations,
            final_inventory: inventory.snapshot(),
            report,
            validation,
        }
    }

    pub fn estimate(&self, name: &str) -> Option<f64> {
        self.report.get(name).map(|entry| entry.estimate)
    }
}

fn build_report(
    stats: &InvocationStats,
    inventory: &StationInventory,
    ledger: &FleetLedger,
    total_riders: u64,
) -> BTreeMap<String, ReportEntry> {
    let spawns = stats.handler(EventKind::SpawnRider);
    let waits = stats.handler(EventKind::WaitForBike);
    let returns = stats.handler(EventKind::ReturnBike);

    let rider_minutes_waiting = waits.ret_val(Outcome::Wait);
    let mean_wait = if total_riders > 0 {
        rider_minutes_waiting as f64 / total_riders as f64
    } else {
        0.0
    };
    let empty_stations = inventory
        .iter()
        .filter(|(_, s)| !s.bikes.is_available())
        .count();
    // Bikes that would have to be trucked back to restore every station's start level.
    let imbalance: u64 = inventory
        .iter()
        .map(|(id, s)| s.departures.saturating_sub(returns.ret_val(Outcome::Station(id))))
        .sum();

    [
        ("riders_spawned", total_riders as f64),
        ("riders_limited", spawns.ret_val(Outcome::Limited) as f64),
        ("trips_started", ledger.trips_started() as f64),
        ("trips_completed", ledger.trips_completed() as f64),
        ("rider_minutes_waiting", rider_minutes_waiting as f64),
        ("mean_wait_minutes", mean_wait),
        ("riders_still_waiting", inventory.waiting_riders() as f64),
        ("bikes_in_transit", ledger.in_transit() as f64),
        ("empty_stations", empty_stations as f64),
        ("inventory_imbalance", imbalance as f64),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), ReportEntry::from(value)))
    .collect()
}

/// A single run. Build it, optionally supply a spawn plan, then call [Simulation::run].
pub struct Simulation {
    world: World,
    schedule: Schedule,
    spawn_plan: Option<SpawnPlan>,
    result: Option<SimulationResult>,
}

impl Simulation {
    pub fn new(config: SimulationConfig, network: StationNetwork) -> Result<Self, SimulationError> {
        let mut world = World::new();
        build_simulation(&mut world, &config, &network)?;
        Ok(Self {
            world,
            schedule: simulation_schedule(),
            spawn_plan: None,
            result: None,
        })
    }

    /// Uses `plan` instead of drawing arrivals. It must cover the horizon exactly.
    pub fn with_spawn_plan(mut self, plan: SpawnPlan) -> Result<Self, ConfigError> {
        let horizon = self.world.resource::<SimulationConfig>().end_time;
        if plan.per_minute.len() as u64 != horizon {
            return Err(ConfigError::SpawnPlanLength {
                found: plan.per_minute.len(),
                horizon,
            });
        }
        self.spawn_plan = Some(plan);
        Ok(self)
    }

    /// Runs to the horizon. Later calls return the first result without running again.
    pub fn run(&mut self) -> &SimulationResult {
        self.run_with_hook(|_, _| {})
    }

    /// [Simulation::run], invoking `hook` after every handled event.
    /// The hook is ignored once the run has completed.
    pub fn run_with_hook<F>(&mut self, hook: F) -> &SimulationResult
    where
        F: FnMut(&World, &ScheduledEvent),
    {
        self.result.get_or_insert_with(|| {
            execute(
                &mut self.world,
                &mut self.schedule,
                self.spawn_plan.take(),
                hook,
            )
        })
    }

    pub fn result(&self) -> Option<&SimulationResult> {
        self.result.as_ref()
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}

fn execute<F>(
    world: &mut World,
    schedule: &mut Schedule,
    plan: Option<SpawnPlan>,
    hook: F,
) -> SimulationResult
where
    F: FnMut(&World, &ScheduledEvent),
{
    match plan {
        Some(plan) => seed_spawn_plan(world, plan),
        None => initialize_simulation(world),
    }
    info!(
        stations = world.resource::<StationInventory>().len(),
        planned_riders = world.resource::<SpawnPlan>().total(),
        "starting simulation"
    );

    run_until_horizon_with_hook(world, schedule, hook);

    let result = SimulationResult::collect(world);
    info!(
        riders = result.total_riders,
        trips = result.estimate("trips_started").unwrap_or_default(),
        "simulation finished"
    );
    result
}
