//! Simulated time.

use crate::common::TICKS_PER_SECOND;

/// Monotonic simulated clock, in ticks.
///
/// Only the run loop advances it; everything else reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationClock {
    now: u64,
}

impl SimulationClock {
    /// Clock at tick zero.
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Current tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Current time in simulated seconds.
    pub fn seconds(&self) -> f64 {
        self.now as f64 / TICKS_PER_SECOND as f64
    }

    pub(crate) const fn advance(&mut self, ticks: u64) {
        self.now = self.now.saturating_add(ticks);
    }
}
