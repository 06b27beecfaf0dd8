//! TakeBike system: undock a bike, start the ride and schedule its return.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, Event, Priority, SimulationClock};
use crate::distributions::StochasticModel;
use crate::runner::schedule_event;
use crate::stations::{FleetLedger, StationInventory};
use crate::systems::HandlerOutcome;
use crate::telemetry::{InvocationStats, Outcome};

pub fn take_bike_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut stats: ResMut<InvocationStats>,
    mut inventory: ResMut<StationInventory>,
    mut ledger: ResMut<FleetLedger>,
    mut model: ResMut<StochasticModel>,
    mut outcome: ResMut<HandlerOutcome>,
) {
    let Event::TakeBike { station } = event.0.event else {
        return;
    };
    let now = event.0.at;
    let Some(dock) = inventory.get_mut(station) else {
        return;
    };

    if !dock.bikes.take() {
        // Another rider got the last bike first. The rider is still queued here.
        schedule_event(
            &mut clock,
            &mut stats,
            now,
            Event::WaitForBike { station },
            Priority::Normal,
            1,
        );
        outcome.0 = Some(Outcome::Requeued);
        return;
    }

    dock.waiting = dock.waiting.saturating_sub(1);
    dock.departures += 1;
    ledger.depart();

    let ride = model.draw_ride_minutes();
    schedule_event(
        &mut clock,
        &mut stats,
        now.saturating_add(ride),
        Event::ReturnBike { origin: station },
        Priority::Important,
        1,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::EventKind;
    use crate::stations::StationId;
    use crate::test_helpers::{
        create_test_world, set_current_event, tiny_config, two_station_network,
    };

    fn take_at(world: &mut World, at: u64, station: StationId) -> Option<Outcome> {
        set_current_event(world, at, Event::TakeBike { station }, Priority::Important);
        world.insert_resource(HandlerOutcome::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(take_bike_system);
        schedule.run(world);
        world.resource_mut::<HandlerOutcome>().0.take()
    }

    #[test]
    fn take_moves_one_bike_into_transit() {
        let mut world = create_test_world(&tiny_config(5), &two_station_network());
        world
            .resource_mut::<StationInventory>()
            .get_mut(StationId(0))
            .expect("west")
            .waiting = 1;

        assert_eq!(take_at(&mut world, 0, StationId(0)), None);

        let west = world
            .resource::<StationInventory>()
            .get(StationId(0))
            .cloned()
            .expect("west");
        assert_eq!(west.bikes.count(), Some(0));
        assert_eq!(west.waiting, 0);
        assert_eq!(west.departures, 1);

        let ledger = world.resource::<FleetLedger>();
        assert_eq!(ledger.in_transit(), 1);
        assert_eq!(ledger.trips_started(), 1);
        assert!(ledger.conservation_holds(world.resource::<StationInventory>()));

        let clock = world.resource::<SimulationClock>();
        let stats = world.resource::<InvocationStats>();
        let queued_returns = clock.pending();
        let overtime_returns = stats.handler(EventKind::ReturnBike).overtime.total;
        assert_eq!(queued_returns as u64 + overtime_returns, 1);
    }

    #[test]
    fn depleted_station_requeues_the_rider() {
        let mut world = create_test_world(&tiny_config(5), &two_station_network());
        assert_eq!(take_at(&mut world, 3, StationId(1)), None);

        assert_eq!(take_at(&mut world, 3, StationId(1)), Some(Outcome::Requeued));

        let east = world
            .resource::<StationInventory>()
            .get(StationId(1))
            .cloned()
            .expect("east");
        assert_eq!(east.bikes.count(), Some(0));
        assert_eq!(east.departures, 1);
        assert_eq!(world.resource::<FleetLedger>().trips_started(), 1);

        let mut clock = world.resource_mut::<SimulationClock>();
        let requeued = std::iter::from_fn(|| clock.pop_front(3)).find(|e| {
            e.event
                == Event::WaitForBike {
                    station: StationId(1),
                }
        });
        assert!(requeued.is_some());
    }

    #[test]
    fn ride_past_any_representable_minute_is_overtime() {
        let config = tiny_config(5).with_ride_time(50.0, 0.0).with_end_time(10);
        let mut world = create_test_world(&config, &two_station_network());

        assert_eq!(take_at(&mut world, 3, StationId(0)), None);

        let stats = world.resource::<InvocationStats>();
        let returns = stats.handler(EventKind::ReturnBike);
        assert_eq!(returns.overtime.total, 1);
        assert_eq!(returns.overtime.arg_count("origin", StationId(0)), 1);
        assert_eq!(world.resource::<SimulationClock>().pending(), 0);

        let ledger = world.resource::<FleetLedger>();
        assert_eq!(ledger.in_transit(), 1);
        assert!(ledger.conservation_holds(world.resource::<StationInventory>()));
    }
}
