//! Bounded acquisition of the per-session action lock.
//!
//! Action batches must never interleave at the primitive level, so a second
//! batch waits for the first with exponential backoff plus random jitter and
//! gives up after the configured timeout.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use rand::Rng;

use crate::usecases::ports::{Clock, Sleeper};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_BACKOFF: Duration = Duration::from_millis(50);
const INITIAL_BACKOFF: Duration = Duration::from_micros(100);

/// Up to a quarter of the current backoff.
fn compute_jitter(backoff_micros: u64) -> u64 {
    let jitter_range = backoff_micros / 4;
    if jitter_range == 0 {
        return 0;
    }
    rand::rng().random_range(0..jitter_range)
}

fn next_backoff(backoff: Duration) -> Duration {
    (backoff * 2).min(MAX_BACKOFF)
}

/// Returns `None` when the lock stayed held for the whole `timeout`.
///
/// A poisoned lock is recovered; the guarded value is `()` so there is no
/// state to distrust.
pub fn acquire_action_lock<'a>(
    lock: &'a Mutex<()>,
    timeout: Duration,
    clock: &dyn Clock,
    sleeper: &dyn Sleeper,
) -> Option<MutexGuard<'a, ()>> {
    let start = clock.now();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match lock.try_lock() {
            Ok(guard) => return Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {}
        }
        if clock.elapsed(start) >= timeout {
            return None;
        }
        let jitter = compute_jitter(u64::try_from(backoff.as_micros()).unwrap_or(u64::MAX));
        sleeper.sleep(backoff + Duration::from_micros(jitter));
        backoff = next_backoff(backoff);
    }
}
