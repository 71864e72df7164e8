use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::kernel::time::Tick;

/// Events kept before the oldest ones are overwritten.
pub const CAPACITY: usize = 10_000;

/// Bounded history of what the kernel decided, newest last.
#[derive(Debug)]
pub struct TelemetryRecorder {
    ring: VecDeque<TelemetryEvent>,
    capacity: usize,
    overwritten: u64,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            overwritten: 0,
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
            self.overwritten += 1;
        }
        self.ring.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.ring.iter()
    }

    /// Events recorded at `tick` or later.
    pub fn since(&self, tick: Tick) -> impl Iterator<Item = &TelemetryEvent> {
        self.ring.iter().filter(move |event| event.tick() >= tick)
    }

    /// How many events fell off the front of the ring.
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.ring)
    }

    pub fn clear(&mut self) {
        self.ring.clear();
        self.overwritten = 0;
    }
}
