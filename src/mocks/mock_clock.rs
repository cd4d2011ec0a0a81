// This file is only compiled during tests

use std::time::Duration;

use crate::clock::Clock;

/// Simulated clock: sleeping advances time instantly.
#[derive(Debug, Default)]
pub struct MockClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward without recording a sleep, e.g. to simulate slow I/O.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}
