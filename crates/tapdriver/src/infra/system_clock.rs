use std::time::Instant;

use crate::usecases::ports::Clock;

/// Monotonic wall clock backed by `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let start = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.elapsed(start) >= Duration::from_millis(2));
    }
}
