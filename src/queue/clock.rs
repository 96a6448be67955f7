//! Clocks for the task queue.
//!
//! Queue time is a [`Duration`] since the clock's origin. Tests drive a
//! [`ManualClock`]; the server uses a [`TokioClock`], which also follows
//! tokio's paused test time.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Monotonic time source.
pub trait Clock: Send + Sync + Debug {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, at: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Clock backed by `tokio::time::Instant`.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
