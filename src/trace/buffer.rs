//! Bounded retention for telemetry events.
//!
//! Recent events are kept in a fixed-capacity deque. Once the cap is
//! reached, every new event evicts the oldest retained one, so memory use
//! stays constant no matter how long the runtime lives.

use super::event::TraceEvent;
use std::collections::VecDeque;

/// A bounded, oldest-evicting store of telemetry events.
#[derive(Debug)]
pub struct TraceBuffer {
    cap: usize,
    events: VecDeque<TraceEvent>,
}

impl TraceBuffer {
    /// Creates a buffer retaining up to `capacity` events.
    ///
    /// A capacity of zero is raised to one so the most recent event is
    /// always observable.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            cap,
            events: VecDeque::with_capacity(cap),
        }
    }

    /// Maximum number of retained events.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Number of currently retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Appends an event, evicting the oldest one when at capacity.
    pub fn push(&mut self, event: TraceEvent) {
        if self.events.len() == self.cap {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Iterates over retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Discards all retained events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
