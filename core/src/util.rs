use rand::Rng;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

/// A poisoned lock only means another thread panicked mid-update; the
/// bookkeeping guarded here is all saturating counters, so continuing
/// with the inner value is strictly better than propagating the panic.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

const INITIAL_DELAY_MS: u64 = 200;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Exponential backoff with jitter for bump retries. `attempt` starts
/// at 1 for the delay after the first failure.
pub(crate) fn backoff(attempt: u32) -> Duration {
    let exp = BACKOFF_FACTOR.powi(attempt.saturating_sub(1) as i32);
    let base = (INITIAL_DELAY_MS as f64 * exp) as u64;
    let jitter: f64 = rand::rng().random_range(0.9..1.1);
    Duration::from_millis((base as f64 * jitter) as u64).min(MAX_DELAY)
}
