mod support;

use bikeshare_core::clock::{Event, EventKind, Priority};
use bikeshare_core::runner::schedule_at;
use bikeshare_core::stations::{FleetLedger, StationCapacity, StationId, StationInventory};
use bikeshare_core::telemetry::{InvocationStats, Outcome};
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

#[test]
fn one_rider_borrows_and_returns_a_bike() {
    // exp(1.1) rounds to 3: the bike is back at minute 3.
    let mut world = TestWorldBuilder::new()
        .with_capacity(StationCapacity::Finite(1))
        .with_rider_cap(1)
        .with_horizon(100)
        .with_fixed_ride(1.1)
        .build();
    schedule_at(&mut world, 0, Event::SpawnRider, Priority::Normal, 1);

    let mut runner = ScheduleRunner::new();
    let mut emptied_at = None;
    let handled = runner.run_full_with_hook(&mut world, |world, event| {
        if event.event.kind() == EventKind::TakeBike {
            let inventory = world.resource::<StationInventory>();
            assert_eq!(inventory.docked_bikes(), Some(1));
            let empty = inventory
                .iter()
                .filter(|(_, s)| s.bikes.count() == Some(0))
                .count();
            assert_eq!(empty, 1);
            emptied_at = Some(event.at);
        }
    });

    // spawn, wait, take, return
    assert_eq!(handled, 4);
    assert_eq!(emptied_at, Some(0));

    let stats = world.resource::<InvocationStats>();
    let spawns = stats.handler(EventKind::SpawnRider);
    assert_eq!(spawns.total(), 1);
    let origin = spawns
        .ret_vals
        .keys()
        .find_map(|o| match o {
            Outcome::Station(id) => Some(*id),
            _ => None,
        })
        .expect("spawn outcome keyed by origin");
    assert_eq!(spawns.ret_vals.len(), 1);

    let returns = stats.handler(EventKind::ReturnBike);
    assert_eq!(returns.total(), 1);
    assert_eq!(returns.calls.arg_count("origin", origin), 1);
    let destination = StationId::from_index(1 - origin.index());
    assert_eq!(returns.ret_val(Outcome::Station(destination)), 1);

    let inventory = world.resource::<StationInventory>();
    assert_eq!(inventory.docked_bikes(), Some(2));
    assert_eq!(inventory.waiting_riders(), 0);
    assert_eq!(world.resource::<FleetLedger>().in_transit(), 0);
}

#[test]
fn riders_at_an_empty_station_wait_for_a_returning_bike() {
    // Both riders start at `west`; only one bike is docked there.
    let network = bikeshare_core::test_helpers::network_from(
        &["west", "east"],
        vec![1.0, 0.0],
        vec![vec![1.0, 0.0], vec![1.0, 0.0]],
    );
    let mut world = TestWorldBuilder::new()
        .with_network(network)
        .with_capacity(StationCapacity::Finite(1))
        .with_rider_cap(2)
        .with_horizon(50)
        .with_fixed_ride(1.6)
        .build();
    schedule_at(&mut world, 0, Event::SpawnRider, Priority::Normal, 2);

    ScheduleRunner::new().run_full(&mut world);

    let stats = world.resource::<InvocationStats>();
    let waits = stats.handler(EventKind::WaitForBike);
    // Ride of round(exp(1.6)) = 5 minutes: the second rider waits minutes 0..=4.
    assert_eq!(waits.ret_val(Outcome::Wait), 5);
    assert_eq!(waits.ret_val(Outcome::Take), 2);
    assert_eq!(stats.handler(EventKind::TakeBike).total(), 2);

    let west = world
        .resource::<StationInventory>()
        .get(StationId(0))
        .cloned()
        .expect("west");
    assert_eq!(west.bikes.count(), Some(1));
    assert_eq!(west.waiting, 0);
    assert_eq!(west.departures, 2);
}
