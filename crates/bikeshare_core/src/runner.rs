//! Simulation runner: drains minute buckets and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event of the current bucket, inserts it as [CurrentEvent],
//! runs the schedule, then records the invocation in [InvocationStats].

use bevy_ecs::prelude::{Mut, Res, Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};
use tracing::{debug, info, warn};

use crate::clock::{
    Admission, CurrentEvent, Event, EventKind, Minute, Priority, ScheduledEvent, SimulationClock,
};
use crate::distributions::{SpawnPlan, StochasticModel};
use crate::systems::{
    return_bike::return_bike_system, spawn_rider::spawn_rider_system,
    take_bike::take_bike_system, wait_for_bike::wait_for_bike_system, HandlerOutcome,
};
use crate::telemetry::InvocationStats;

/// Run condition: the current event is of `kind`.
fn current_event_is(kind: EventKind) -> impl FnMut(Option<Res<CurrentEvent>>) -> bool + Clone {
    move |event: Option<Res<CurrentEvent>>| {
        event.map(|e| e.0.event.kind() == kind).unwrap_or(false)
    }
}

/// Queues `repeat` copies of `event` at minute `at`.
///
/// Events at or past the horizon are tallied as overtime. Events aimed at an
/// already drained minute are logged and dropped.
pub fn schedule_event(
    clock: &mut SimulationClock,
    stats: &mut InvocationStats,
    at: Minute,
    event: Event,
    priority: Priority,
    repeat: u64,
) -> Admission {
    let admission = clock.schedule(at, event, priority, repeat);
    match admission {
        Admission::Queued => {}
        Admission::Overtime => stats.record_overtime(&event, repeat),
        Admission::Stale => warn!(
            at,
            now = clock.now(),
            kind = event.kind().name(),
            "dropped event scheduled into a drained minute"
        ),
    }
    admission
}

/// [schedule_event] against the resources in `world`.
pub fn schedule_at(
    world: &mut World,
    at: Minute,
    event: Event,
    priority: Priority,
    repeat: u64,
) -> Admission {
    world.resource_scope(|world, mut clock: Mut<SimulationClock>| {
        let mut stats = world.resource_mut::<InvocationStats>();
        schedule_event(&mut clock, &mut stats, at, event, priority, repeat)
    })
}

/// Builds the simulation schedule: one system per event kind, each gated on the current event.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    // Handlers mutate shared state in strict event order.
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((
        spawn_rider_system.run_if(current_event_is(EventKind::SpawnRider)),
        wait_for_bike_system.run_if(current_event_is(EventKind::WaitForBike)),
        take_bike_system.run_if(current_event_is(EventKind::TakeBike)),
        return_bike_system.run_if(current_event_is(EventKind::ReturnBike)),
    ));
    schedule
}

/// Runs the next event of minute `at`, if any, and records the invocation.
pub fn run_next_event(
    world: &mut World,
    schedule: &mut Schedule,
    at: Minute,
) -> Option<ScheduledEvent> {
    let event = world.resource_mut::<SimulationClock>().pop_front(at)?;
    world.insert_resource(CurrentEvent(event));
    world.resource_mut::<HandlerOutcome>().0 = None;

    schedule.run(world);

    let outcome = world.resource_mut::<HandlerOutcome>().0.take();
    world
        .resource_mut::<InvocationStats>()
        .record_call(&event.event, outcome);
    Some(event)
}

/// Drains minute `at` to empty, including events queued while draining, then retires it.
/// Returns the number of events handled.
pub fn drain_bucket(world: &mut World, schedule: &mut Schedule, at: Minute) -> u64 {
    drain_bucket_with_hook(world, schedule, at, |_, _| {})
}

/// [drain_bucket], invoking `hook` after every handled event.
pub fn drain_bucket_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    at: Minute,
    mut hook: F,
) -> u64
where
    F: FnMut(&World, &ScheduledEvent),
{
    let mut handled = 0;
    while let Some(event) = run_next_event(world, schedule, at) {
        hook(world, &event);
        handled += 1;
    }
    world.resource_mut::<SimulationClock>().retire(at);
    handled
}

/// Drains every minute from 0 to the horizon. Returns the number of events handled.
pub fn run_until_horizon(world: &mut World, schedule: &mut Schedule) -> u64 {
    run_until_horizon_with_hook(world, schedule, |_, _| {})
}

/// [run_until_horizon], invoking `hook` after every handled event.
pub fn run_until_horizon_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    mut hook: F,
) -> u64
where
    F: FnMut(&World, &ScheduledEvent),
{
    let horizon = world.resource::<SimulationClock>().horizon();
    let mut total = 0;
    for minute in 0..horizon {
        let handled = drain_bucket_with_hook(world, schedule, minute, &mut hook);
        if handled > 0 {
            debug!(minute, handled, "drained minute");
        }
        total += handled;
    }
    info!(horizon, events = total, "simulation reached horizon");
    total
}

/// Queues the SpawnRider events of `plan`, one batch per minute, and stores the plan.
/// Minutes at or past the horizon are tallied as overtime.
pub fn seed_spawn_plan(world: &mut World, plan: SpawnPlan) {
    for (minute, &count) in plan.per_minute.iter().enumerate() {
        if count > 0 {
            schedule_at(world, minute as Minute, Event::SpawnRider, Priority::Normal, count);
        }
    }
    debug!(planned = plan.total(), "seeded spawn plan");
    world.insert_resource(plan);
}

/// Draws the per-minute arrival counts from the model and seeds them.
/// Call this after building the world and before running events.
pub fn initialize_simulation(world: &mut World) {
    let horizon = world.resource::<SimulationClock>().horizon();
    let plan = world.resource_mut::<StochasticModel>().spawn_plan(horizon);
    seed_spawn_plan(world, plan);
}
