//! Retry-with-backoff combinator shared by the collector and the summarizer.
//!
//! A [`RetryPolicy`] wraps any async operation returning
//! [`crate::error::Result`]. Retryable errors (see
//! [`NewsError::is_retryable`]) are attempted again after a delay until the
//! attempt budget is spent; anything else is returned immediately.
//!
//! # Backoff Strategy
//!
//! ```text
//! fixed:       delay = base_delay
//! exponential: delay = min(base_delay * 2^(attempt-1), max_delay)
//! both:        delay += random_jitter(0..=jitter_ms)
//! ```

use crate::error::{NewsError, Result};
use rand::{Rng, rng};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: usize,
    pub base_delay: Duration,
    /// Upper bound for exponential delays.
    pub max_delay: Duration,
    pub backoff: Backoff,
    pub jitter_ms: u64,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
            jitter_ms: 0,
        }
    }

    pub fn exponential(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff: Backoff::Exponential,
            jitter_ms: 250,
        }
    }

    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Delay to wait after the given failed attempt (1-based), before jitter.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(16) as u32;
                self.base_delay
                    .saturating_mul(1u32 << shift)
                    .min(self.max_delay)
            }
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is exhausted.
    ///
    /// # Arguments
    ///
    /// * `label` - Name used in the retry log lines (e.g. `"collect 정치"`)
    /// * `op` - Builds a fresh future for each attempt
    ///
    /// # Returns
    ///
    /// The first successful value.
    ///
    /// # Errors
    ///
    /// The error from the last attempt, or the first non-retryable one.
    /// Retries sleep for [`RetryPolicy::delay_for`] plus random jitter.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() {
                        error!(label, attempt, error = %e, "non-retryable failure");
                        return Err(e);
                    }

                    if attempt >= max_attempts {
                        error!(
                            label,
                            attempt,
                            max = max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.delay_for(attempt);
                    if self.jitter_ms > 0 {
                        let jitter: u64 = rng().random_range(0..=self.jitter_ms);
                        delay += Duration::from_millis(jitter);
                    }

                    warn!(
                        label,
                        attempt,
                        max = max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::exponential(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Shorthand used by tests and callers that never want to wait.
#[cfg(test)]
pub fn immediate(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::fixed(max_attempts, Duration::ZERO)
}
