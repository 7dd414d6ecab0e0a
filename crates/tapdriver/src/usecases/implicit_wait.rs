use std::time::Duration;

use crate::usecases::ports::{Clock, Sleeper};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Re-runs `lookup` every `interval` until it yields `Some` or `timeout` elapses.
///
/// The lookup always runs at least once, so a zero timeout is a single attempt.
/// Errors from the lookup end the wait immediately.
pub fn poll_until<T, E>(
    clock: &dyn Clock,
    sleeper: &dyn Sleeper,
    timeout: Duration,
    interval: Duration,
    mut lookup: impl FnMut() -> Result<Option<T>, E>,
) -> Result<Option<T>, E> {
    let start = clock.now();
    let deadline = start + timeout;
    loop {
        if let Some(found) = lookup()? {
            return Ok(Some(found));
        }
        let now = clock.now();
        if now >= deadline {
            return Ok(None);
        }
        let remaining = deadline.saturating_duration_since(now);
        sleeper.sleep(interval.min(remaining).max(Duration::from_millis(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::ports::test_support::MockClock;

    #[test]
    fn test_zero_timeout_looks_once() {
        let clock = MockClock::new();
        let mut calls = 0;
        let result: Result<Option<()>, ()> =
            poll_until(&clock, &clock, Duration::ZERO, DEFAULT_POLL_INTERVAL, || {
                calls += 1;
                Ok(None)
            });
        assert_eq!(result, Ok(None));
        assert_eq!(calls, 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn test_found_on_third_attempt() {
        let clock = MockClock::new();
        let mut calls = 0;
        let result: Result<Option<u32>, ()> = poll_until(
            &clock,
            &clock,
            Duration::from_secs(5),
            Duration::from_millis(200),
            || {
                calls += 1;
                Ok((calls == 3).then_some(7))
            },
        );
        assert_eq!(result, Ok(Some(7)));
        assert_eq!(clock.sleeps(), 2);
        assert_eq!(clock.total_slept(), Duration::from_millis(400));
    }

    #[test]
    fn test_gives_up_at_deadline() {
        let clock = MockClock::new();
        let mut calls = 0;
        let result: Result<Option<()>, ()> = poll_until(
            &clock,
            &clock,
            Duration::from_millis(500),
            Duration::from_millis(200),
            || {
                calls += 1;
                Ok(None)
            },
        );
        assert_eq!(result, Ok(None));
        // 0, 200, 400, 500
        assert_eq!(calls, 4);
        assert_eq!(clock.total_slept(), Duration::from_millis(500));
    }

    #[test]
    fn test_lookup_error_stops_polling() {
        let clock = MockClock::new();
        let mut calls = 0;
        let result: Result<Option<()>, &str> = poll_until(
            &clock,
            &clock,
            Duration::from_secs(5),
            Duration::from_millis(200),
            || {
                calls += 1;
                Err("gone")
            },
        );
        assert_eq!(result, Err("gone"));
        assert_eq!(calls, 1);
    }
}
