//! Time-bucketed event scheduler.
//!
//! One bucket per simulated minute up to the horizon. Each bucket keeps an
//! important lane in front of a normal lane, both FIFO, so important events run
//! before any pending normal work of the same minute. Buckets are drained to
//! empty (including events pushed during the drain) and then retired.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;

use crate::stations::StationId;

/// Simulated time in whole minutes.
pub type Minute = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SpawnRider,
    WaitForBike,
    TakeBike,
    ReturnBike,
}

impl EventKind {
    pub const COUNT: usize = 4;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::SpawnRider,
        EventKind::WaitForBike,
        EventKind::TakeBike,
        EventKind::ReturnBike,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::SpawnRider => "spawn_rider",
            EventKind::WaitForBike => "wait_for_bike",
            EventKind::TakeBike => "take_bike",
            EventKind::ReturnBike => "return_bike",
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// A rider-lifecycle transition together with its bound arguments.
/// The rider itself is anonymous; the station index is all the context it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SpawnRider,
    WaitForBike { station: StationId },
    TakeBike { station: StationId },
    ReturnBike { origin: StationId },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SpawnRider => EventKind::SpawnRider,
            Event::WaitForBike { .. } => EventKind::WaitForBike,
            Event::TakeBike { .. } => EventKind::TakeBike,
            Event::ReturnBike { .. } => EventKind::ReturnBike,
        }
    }

    /// Calls `visit` once per bound argument with its name and value.
    pub fn visit_args(&self, mut visit: impl FnMut(&'static str, StationId)) {
        match *self {
            Event::SpawnRider => {}
            Event::WaitForBike { station } | Event::TakeBike { station } => {
                visit("station", station)
            }
            Event::ReturnBike { origin } => visit("origin", origin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    /// Runs ahead of every pending normal event in the same minute.
    Important,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub at: Minute,
    pub event: Event,
    pub priority: Priority,
}

/// The event the schedule is currently handling.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub ScheduledEvent);

/// Result of handing an event to [SimulationClock::schedule].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// At or past the horizon; never executes.
    Overtime,
    /// Targets a bucket that was already drained.
    Stale,
}

#[derive(Debug, Default)]
struct TimeBucket {
    important: VecDeque<ScheduledEvent>,
    normal: VecDeque<ScheduledEvent>,
}

impl TimeBucket {
    fn pop_front(&mut self) -> Option<ScheduledEvent> {
        self.important
            .pop_front()
            .or_else(|| self.normal.pop_front())
    }

    fn len(&self) -> usize {
        self.important.len() + self.normal.len()
    }
}

#[derive(Debug, Resource)]
pub struct SimulationClock {
    horizon: Minute,
    now: Minute,
    /// First minute whose bucket has not been retired.
    open_from: Minute,
    buckets: Vec<TimeBucket>,
}

impl SimulationClock {
    pub fn new(horizon: Minute) -> Self {
        let mut buckets = Vec::new();
        buckets.resize_with(horizon as usize, TimeBucket::default);
        Self {
            horizon,
            now: 0,
            open_from: 0,
            buckets,
        }
    }

    pub fn horizon(&self) -> Minute {
        self.horizon
    }

    /// Minute currently (or most recently) being drained.
    pub fn now(&self) -> Minute {
        self.now
    }

    /// Inserts `repeat` copies of `event` into the bucket for minute `at`.
    pub fn schedule(
        &mut self,
        at: Minute,
        event: Event,
        priority: Priority,
        repeat: u64,
    ) -> Admission {
        if at >= self.horizon {
            return Admission::Overtime;
        }
        if at < self.open_from {
            return Admission::Stale;
        }
        let bucket = &mut self.buckets[at as usize];
        let lane = match priority {
            Priority::Important => &mut bucket.important,
            Priority::Normal => &mut bucket.normal,
        };
        let scheduled = ScheduledEvent {
            at,
            event,
            priority,
        };
        lane.extend(std::iter::repeat(scheduled).take(repeat as usize));
        Admission::Queued
    }

    /// Next event of minute `at`, important lane first.
    pub fn pop_front(&mut self, at: Minute) -> Option<ScheduledEvent> {
        if at < self.open_from || at >= self.horizon {
            return None;
        }
        self.now = at;
        self.buckets[at as usize].pop_front()
    }

    /// Discards the bucket for `at` and every earlier one.
    pub fn retire(&mut self, at: Minute) {
        let end = at.saturating_add(1).min(self.horizon);
        for t in self.open_from..end {
            self.buckets[t as usize] = TimeBucket::default();
        }
        self.open_from = self.open_from.max(end);
    }

    pub fn is_retired(&self, at: Minute) -> bool {
        at < self.open_from
    }

    /// Events queued for minute `at`.
    pub fn pending_at(&self, at: Minute) -> usize {
        self.buckets.get(at as usize).map_or(0, TimeBucket::len)
    }

    /// Events queued across all open buckets.
    pub fn pending(&self) -> usize {
        self.buckets[self.open_from.min(self.horizon) as usize..]
            .iter()
            .map(TimeBucket::len)
            .sum()
    }
}
