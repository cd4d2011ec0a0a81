use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source plus the one way this crate waits: a blocking sleep.
///
/// Every pacing decision (cycle period, countdowns, batch sampling) goes through this trait so
/// the loops can be driven by a simulated clock in tests.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);

    fn elapsed_since(&self, start: Duration) -> Duration {
        self.now().saturating_sub(start)
    }
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Parks the calling thread forever. Used for the fatal init failure and nothing else.
pub fn halt() -> ! {
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_clock::MockClock;

    #[test]
    fn test_system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.elapsed_since(start) >= Duration::from_millis(5));
    }

    #[test]
    fn test_elapsed_since_saturates() {
        let clock = MockClock::new();
        assert_eq!(
            clock.elapsed_since(Duration::from_secs(10)),
            Duration::ZERO
        );
    }
}
