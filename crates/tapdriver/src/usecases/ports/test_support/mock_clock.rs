use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::usecases::ports::{Clock, Sleeper};

/// Records sleeps without sleeping.
#[derive(Debug, Default)]
pub struct MockSleeper {
    call_count: AtomicU64,
    durations: Mutex<Vec<Duration>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn total_duration(&self) -> Duration {
        self.durations.lock().unwrap().iter().sum()
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.durations.lock().unwrap().push(duration);
    }
}

/// Monotonic clock that only moves when slept on or advanced by hand.
///
/// Implements both [`Clock`] and [`Sleeper`], so a wait loop driven by it
/// sees time pass exactly by the amounts it sleeps.
#[derive(Debug)]
pub struct MockClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeper: MockSleeper,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeper: MockSleeper::new(),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    pub fn sleeps(&self) -> u64 {
        self.sleeper.call_count()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeper.total_duration()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }
}

impl Sleeper for MockClock {
    fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sleeper_does_not_sleep() {
        let sleeper = MockSleeper::new();
        let start = Instant::now();
        sleeper.sleep(Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(sleeper.call_count(), 1);
    }

    #[test]
    fn test_mock_clock_advances_on_sleep() {
        let clock = MockClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(250));
        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.elapsed(start), Duration::from_millis(300));
        assert_eq!(clock.sleeps(), 1);
        assert_eq!(clock.total_slept(), Duration::from_millis(250));
    }
}
