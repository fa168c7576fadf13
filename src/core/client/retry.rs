use std::time::Duration;

use crate::core::NpiError;

/// Configuration for the automatic retry mechanism.
///
/// Retry `n` (starting at 1) waits `min(max_delay, initial_delay * backoff_multiplier^(n-1))`.
/// With the defaults that is 100ms, 200ms, 400ms, capped at 5s. The first attempt never waits.
///
/// Only transient failures are retried: 5xx, 429, and failures below the protocol layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// The maximum number of retries. The total number of attempts is `max_retries + 1`;
    /// `0` means a single attempt.
    pub max_retries: u32,
    /// The delay before the first retry.
    pub initial_delay: Duration,
    /// The upper bound for any single delay.
    pub max_delay: Duration,
    /// The factor applied to the delay after each retry. Must be at least `1.0`.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// The delay to wait before retry number `retry` (1-based). Retry `0` is the first attempt
    /// and has no delay.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exp = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exp);
        // bounds checked, so the cast below cannot truncate
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.round() as u64)
    }

    /// Rejects policies that cannot produce a sane backoff sequence.
    ///
    /// # Errors
    ///
    /// Returns `NpiError::Config` if `max_delay < initial_delay` or the multiplier is below
    /// `1.0` (or not finite).
    pub fn validate(&self) -> Result<(), NpiError> {
        if self.max_delay < self.initial_delay {
            return Err(NpiError::Config(format!(
                "retry max_delay ({:?}) must not be less than initial_delay ({:?})",
                self.max_delay, self.initial_delay
            )));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(NpiError::Config(format!(
                "retry backoff_multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

/// Defines the behavior of the in-memory cache for a single lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present; otherwise, fetch from the network
    /// and write the result to the cache. (Default)
    #[default]
    Use,
    /// Always fetch from the network, bypassing any cached entry, and write the new result to the cache.
    Refresh,
    /// Always fetch from the network and do not read from or write to the cache.
    Bypass,
}
