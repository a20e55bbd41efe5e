// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Catch-up scheduler
//!
//! The processor is the master clock. After it has run for a slice of
//! cycles, [`Scheduler::synchronize`] charges that slice to every other
//! [`Component`] as a deficit and runs each component's `main()` until its
//! local clock is non-negative again. Afterwards the shared [`EventQueue`]
//! fires every event whose deadline has passed, in clock order.
//!
//! Only one component runs at a time, so no locking is involved.
//!
//! # Example
//!
//! ```
//! use cpux::core::timing::EventQueue;
//!
//! let mut queue = EventQueue::new();
//! let vblank = queue.register_periodic_event("vblank", 1000);
//! queue.schedule(vblank, 1000);
//!
//! assert!(queue.advance(999).is_empty());
//! assert_eq!(queue.advance(1), vec![vblank]);
//! ```

/// Tick count type (relative time in cycles)
pub type TickCount = i32;

/// Global tick counter type (absolute time in cycles since reset)
pub type GlobalTicks = u64;

/// Event handle (identifier for registered events)
pub type EventHandle = usize;

/// One registered event
#[derive(Debug, Clone)]
pub struct TimingEvent {
    /// Event name (for debugging)
    pub name: &'static str,

    /// Next execution time (global ticks)
    pub next_run_time: GlobalTicks,

    /// Interval for periodic events (0 = one-shot)
    pub interval: TickCount,

    /// Whether this event is currently scheduled
    pub active: bool,
}

/// Shared event queue
///
/// Events are identified by the handle returned at registration. The
/// pending order is kept as a list of handles sorted by deadline, ties
/// broken by handle, so reordering never changes which event a handle
/// refers to.
#[derive(Debug, Default)]
pub struct EventQueue {
    now: GlobalTicks,
    events: Vec<TimingEvent>,
    pending: Vec<EventHandle>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current absolute time
    pub fn now(&self) -> GlobalTicks {
        self.now
    }

    /// Register a one-shot event
    ///
    /// The event is inactive until [`EventQueue::schedule`] is called.
    pub fn register_event(&mut self, name: &'static str) -> EventHandle {
        self.register_periodic_event(name, 0)
    }

    /// Register an event that reschedules itself every `interval` ticks
    pub fn register_periodic_event(
        &mut self,
        name: &'static str,
        interval: TickCount,
    ) -> EventHandle {
        let handle = self.events.len();
        self.events.push(TimingEvent {
            name,
            next_run_time: 0,
            interval,
            active: false,
        });
        handle
    }

    /// Schedule `handle` to fire `ticks` cycles from now
    pub fn schedule(&mut self, handle: EventHandle, ticks: TickCount) {
        let Some(event) = self.events.get_mut(handle) else {
            log::warn!("Timing: schedule of unknown event handle {}", handle);
            return;
        };
        event.next_run_time = self.now + ticks.max(0) as GlobalTicks;
        event.active = true;
        self.pending.retain(|&h| h != handle);
        self.insert_pending(handle);
    }

    /// Remove `handle` from the pending list
    pub fn deactivate(&mut self, handle: EventHandle) {
        if let Some(event) = self.events.get_mut(handle) {
            event.active = false;
        }
        self.pending.retain(|&h| h != handle);
    }

    pub fn is_active(&self, handle: EventHandle) -> bool {
        self.events.get(handle).is_some_and(|e| e.active)
    }

    pub fn event(&self, handle: EventHandle) -> Option<&TimingEvent> {
        self.events.get(handle)
    }

    /// Cycles until the earliest pending event, if any
    pub fn downcount(&self) -> Option<GlobalTicks> {
        self.pending
            .first()
            .map(|&h| self.events[h].next_run_time.saturating_sub(self.now))
    }

    /// Advance time by `ticks` and return every event that fired, in the
    /// order of their deadlines
    ///
    /// A periodic event that fell behind by several intervals fires once
    /// per missed interval.
    pub fn advance(&mut self, ticks: GlobalTicks) -> Vec<EventHandle> {
        self.now += ticks;
        let mut fired = Vec::new();

        while let Some(&handle) = self.pending.first() {
            let event = &mut self.events[handle];
            if event.next_run_time > self.now {
                break;
            }
            self.pending.remove(0);

            log::trace!(
                "Timing: event '{}' fired (late: {} ticks)",
                event.name,
                self.now - event.next_run_time
            );

            if event.interval > 0 {
                event.next_run_time += event.interval as GlobalTicks;
                self.insert_pending(handle);
            } else {
                event.active = false;
            }
            fired.push(handle);
        }

        fired
    }

    /// Clear time and deactivate every event, keeping registrations
    pub fn reset(&mut self) {
        self.now = 0;
        self.pending.clear();
        for event in &mut self.events {
            event.active = false;
            event.next_run_time = 0;
        }
    }

    fn insert_pending(&mut self, handle: EventHandle) {
        let key = (self.events[handle].next_run_time, handle);
        let events = &self.events;
        let position = self
            .pending
            .partition_point(|&h| (events[h].next_run_time, h) < key);
        self.pending.insert(position, handle);
    }
}

/// A chip that runs behind the master processor and catches up on demand
pub trait Component {
    /// Name used in trace logs
    fn name(&self) -> &'static str;

    /// Local clock relative to the master; negative means behind
    fn clock(&self) -> i64;

    /// Mutable access to the local clock
    fn clock_mut(&mut self) -> &mut i64;

    /// Run one unit of work and return the cycles it consumed
    fn main(&mut self) -> TickCount;
}

/// Master-clock scheduler
#[derive(Debug, Default)]
pub struct Scheduler {
    events: EventQueue,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Total cycles synchronized since reset
    pub fn cycles(&self) -> GlobalTicks {
        self.events.now()
    }

    /// Charge `elapsed` master cycles to every component, let each catch
    /// up, then fire the events that became due
    pub fn synchronize(
        &mut self,
        elapsed: u32,
        components: &mut [Box<dyn Component>],
    ) -> Vec<EventHandle> {
        for component in components.iter_mut() {
            *component.clock_mut() -= elapsed as i64;
            while component.clock() < 0 {
                // A component reporting zero ticks would never catch up.
                let ticks = component.main().max(1);
                *component.clock_mut() += ticks as i64;
            }
            log::trace!(
                "Scheduler: {} caught up (clock {})",
                component.name(),
                component.clock()
            );
        }
        self.events.advance(elapsed as GlobalTicks)
    }

    pub fn reset(&mut self) {
        self.events.reset();
    }
}
