//! Event handlers, one system per event kind.
//!
//! Each system reads [crate::clock::CurrentEvent], mutates station state,
//! schedules its follow-ups and leaves its result in [HandlerOutcome]. The
//! runner records the invocation after the schedule completes.

use bevy_ecs::prelude::Resource;

use crate::telemetry::Outcome;

pub mod return_bike;
pub mod spawn_rider;
pub mod take_bike;
pub mod wait_for_bike;

/// Outcome of the handler that ran for the current event. Cleared before each dispatch.
#[derive(Debug, Default, Resource)]
pub struct HandlerOutcome(pub Option<Outcome>);
