use std::time::{Duration, Instant};

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Monotonic time source for deadlines.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn elapsed(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }

    fn elapsed_ms(&self, start: Instant) -> u64 {
        saturating_millis(self.elapsed(start))
    }
}
