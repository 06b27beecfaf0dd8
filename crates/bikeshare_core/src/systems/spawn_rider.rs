//! SpawnRider system: admit a rider under the cap and queue them at a drawn origin.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, Event, Priority, SimulationClock};
use crate::distributions::StochasticModel;
use crate::runner::schedule_event;
use crate::stations::{RiderTally, StationInventory};
use crate::systems::HandlerOutcome;
use crate::telemetry::{InvocationStats, Outcome};

pub fn spawn_rider_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut stats: ResMut<InvocationStats>,
    mut tally: ResMut<RiderTally>,
    mut model: ResMut<StochasticModel>,
    mut inventory: ResMut<StationInventory>,
    mut outcome: ResMut<HandlerOutcome>,
) {
    if event.0.event != Event::SpawnRider {
        return;
    }

    if !tally.try_admit() {
        outcome.0 = Some(Outcome::Limited);
        return;
    }

    let origin = model.draw_origin();
    if let Some(station) = inventory.get_mut(origin) {
        station.waiting += 1;
        station.arrivals += 1;
    }
    schedule_event(
        &mut clock,
        &mut stats,
        event.0.at,
        Event::WaitForBike { station: origin },
        Priority::Normal,
        1,
    );
    outcome.0 = Some(Outcome::Station(origin));
}
