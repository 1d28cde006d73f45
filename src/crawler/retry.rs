//! Retry with exponential backoff
//!
//! Every network call of a run goes through [`Backoff::call`]. The first
//! attempt waits a random whole number of seconds drawn from the configured
//! delay range; attempt `k > 1` waits `(d + d * factor)^(k - 1)` seconds,
//! where `d` is the upper bound of the range.

use crate::config::{DelayRange, RetryConfig};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Blocking pause between attempts
///
/// Abstracted so tests can observe delays without waiting them out.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returned once every allowed attempt has failed
#[derive(Debug, Clone, Error)]
#[error("gave up after {attempts} attempts, last error: {last_error}")]
pub struct RetriesExhausted {
    pub attempts: u32,
    pub last_error: String,
}

/// Delay before retry attempt `attempt` (2-based; attempt 1 is the initial call)
pub fn backoff_delay(base_secs: u64, factor: f64, attempt: u32) -> Duration {
    let base = base_secs as f64;
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let secs = (base + base * factor).powi(exponent);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[derive(Clone)]
pub struct Backoff {
    delay_range: DelayRange,
    backoff_factor: f64,
    max_retries: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("delay_range", &self.delay_range)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl Backoff {
    pub fn new(config: &RetryConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            delay_range: config.delay_range,
            backoff_factor: config.backoff_factor,
            max_retries: config.max_retries,
            sleeper,
        }
    }

    /// Upper bound on the number of attempts made by [`call`](Self::call)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before attempt number `attempt` (1-based)
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            let (low, high) = self.delay_range.bounds();
            if low >= high {
                return Duration::from_secs(low);
            }
            Duration::from_secs(rand::random_range(low..=high))
        } else {
            backoff_delay(
                self.delay_range.backoff_base(),
                self.backoff_factor,
                attempt,
            )
        }
    }

    /// Runs `operation` until it succeeds or the retry budget is spent
    ///
    /// # Arguments
    ///
    /// * `what` - Description of the call used in log lines (usually the URL)
    /// * `operation` - The fallible call; invoked at most `max_retries + 1` times
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful result
    /// * `Err(RetriesExhausted)` - Every attempt failed
    pub fn call<T, E, F>(&self, what: &str, mut operation: F) -> Result<T, RetriesExhausted>
    where
        F: FnMut() -> Result<T, E>,
        E: fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if attempt > 1 {
                tracing::info!("Trying {} again. Attempt {}", what, attempt);
            }

            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!("Waiting {:?} before requesting {}", delay, what);
                self.sleeper.sleep(delay);
            }

            match operation() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!("Attempt {} for {} failed: {}", attempt, what, e);
                    if attempt >= self.max_attempts() {
                        tracing::error!(
                            "Max retries exceeded for {} after {} attempts",
                            what,
                            attempt
                        );
                        return Err(RetriesExhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}
