//! Backoff schedule and predicates for retrying failed requests.
//!
//! Retries are opt-in at two levels: the client must be built with retry
//! enabled, and the request itself must be marked retryable (see
//! [`RequestMetadata::retryable`](crate::metadata::RequestMetadata::retryable)).
//! The [`RetryPredicate`] then decides per error whether another attempt is
//! worthwhile, and [`Backoff`] decides how long to wait.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff schedule.
///
/// The delay before retry `n` (1-indexed) is
/// `initial_delay * multiplier^(n - 1)`, capped at `max_delay`. With `jitter`
/// enabled each delay is scaled by a random factor in `[0.5, 1.0]`.
///
/// ```
/// use donately::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff {
///     initial_delay: Duration::from_millis(100),
///     multiplier: 2.0,
///     max_delay: Duration::from_millis(300),
///     jitter: false,
///     ..Backoff::default()
/// };
///
/// assert_eq!(backoff.delay_for_attempt(1), Some(Duration::from_millis(100)));
/// assert_eq!(backoff.delay_for_attempt(2), Some(Duration::from_millis(200)));
/// assert_eq!(backoff.delay_for_attempt(3), Some(Duration::from_millis(300)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// The delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied per retry. Must be finite and >= 1.0.
    pub multiplier: f64,
    /// The maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retries after the first attempt. `None` means the
    /// schedule is bounded only by `max_elapsed`.
    pub max_retries: Option<usize>,
    /// No retry starts once this much time has passed since the first attempt.
    pub max_elapsed: Option<Duration>,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            multiplier: 1.5,
            max_delay: Duration::from_secs(60),
            max_retries: None,
            max_elapsed: Some(Duration::from_secs(15 * 60)),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Returns the delay before the given retry, or `None` if retries are exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        if attempt == 0 || self.max_retries.is_some_and(|max| attempt > max) {
            return None;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
            Some(delay.mul_f64(jitter_factor))
        } else {
            Some(delay)
        }
    }

    /// Checks that the schedule is bounded and non-decreasing.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::Configuration(format!(
                "backoff multiplier must be finite and >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.max_delay < self.initial_delay {
            return Err(Error::Configuration(
                "backoff max_delay must not be smaller than initial_delay".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decides whether a failed request should be retried.
///
/// ```
/// use donately::{Error, RetryPredicate};
///
/// struct FirstThreeOnly;
///
/// impl RetryPredicate for FirstThreeOnly {
///     fn should_retry(&self, error: &Error, attempt: usize) -> bool {
///         error.is_retryable() && attempt <= 3
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the request should be retried.
    ///
    /// `attempt` is the number of the attempt that just failed (1-indexed).
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry errors the classifier marked as retryable.
///
/// This is the default predicate and uses [`Error::is_retryable`].
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}
