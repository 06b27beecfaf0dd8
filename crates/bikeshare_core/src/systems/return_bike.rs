//! ReturnBike system: dock a riding bike at a destination drawn from its origin's row.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, Event};
use crate::distributions::StochasticModel;
use crate::stations::{FleetLedger, StationInventory};
use crate::systems::HandlerOutcome;
use crate::telemetry::Outcome;

pub fn return_bike_system(
    event: Res<CurrentEvent>,
    mut inventory: ResMut<StationInventory>,
    mut ledger: ResMut<FleetLedger>,
    mut model: ResMut<StochasticModel>,
    mut outcome: ResMut<HandlerOutcome>,
) {
    let Event::ReturnBike { origin } = event.0.event else {
        return;
    };

    let destination = model.draw_destination(origin);
    if let Some(dock) = inventory.get_mut(destination) {
        dock.bikes.dock();
    }
    ledger.arrive();
    outcome.0 = Some(Outcome::Station(destination));
}
