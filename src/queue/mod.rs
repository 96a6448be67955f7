//! Task queue simulator.
//!
//! Models background work items that move through `waiting → running →
//! done` on fixed delays, independent of the operator's actions. Time is
//! injected through [`Clock`] so tests can step it deterministically.

mod clock;
mod pump;
mod simulator;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use clock::{Clock, ManualClock, TokioClock};
pub use pump::QueuePump;
pub use simulator::{SharedTaskQueue, StatusChange, Task, TaskQueue, TaskStatus};

/// Delays for the simulated task lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Delay from enqueue until a task starts running.
    /// Default: 300 ms
    pub running_after_ms: u64,

    /// Delay from enqueue until a task is done.
    /// Default: 2600 ms
    pub done_after_ms: u64,

    /// Poll interval of the background pump.
    /// Default: 100 ms
    pub tick_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            running_after_ms: 300,
            done_after_ms: 2_600,
            tick_ms: 100,
        }
    }
}

impl QueueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both lifecycle delays. `done_after` is raised to `running_after`
    /// if it would otherwise fire first.
    pub fn with_delays(mut self, running_after: Duration, done_after: Duration) -> Self {
        self.running_after_ms = running_after.as_millis() as u64;
        self.done_after_ms = (done_after.as_millis() as u64).max(self.running_after_ms);
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick_ms = tick.as_millis() as u64;
        self
    }

    pub fn running_after(&self) -> Duration {
        Duration::from_millis(self.running_after_ms)
    }

    pub fn done_after(&self) -> Duration {
        Duration::from_millis(self.done_after_ms.max(self.running_after_ms))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}
