//! WaitForBike system: take a bike this minute if one is docked, otherwise retry next minute.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, Event, Priority, SimulationClock};
use crate::runner::schedule_event;
use crate::stations::StationInventory;
use crate::systems::HandlerOutcome;
use crate::telemetry::{InvocationStats, Outcome};

pub fn wait_for_bike_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut stats: ResMut<InvocationStats>,
    inventory: Res<StationInventory>,
    mut outcome: ResMut<HandlerOutcome>,
) {
    let Event::WaitForBike { station } = event.0.event else {
        return;
    };
    let now = event.0.at;

    let available = inventory
        .get(station)
        .is_some_and(|s| s.bikes.is_available());

    // The take jumps ahead of other waiting riders in this minute.
    let (at, next, priority, result) = if available {
        (now, Event::TakeBike { station }, Priority::Important, Outcome::Take)
    } else {
        (now + 1, Event::WaitForBike { station }, Priority::Normal, Outcome::Wait)
    };
    schedule_event(&mut clock, &mut stats, at, next, priority, 1);
    outcome.0 = Some(result);
}
