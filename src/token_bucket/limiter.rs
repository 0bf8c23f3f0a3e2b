//! The capability set every limiter exposes.

use super::error::LimiterError;
use super::stats::BucketStats;
use std::fmt;
use std::time::Duration;

/// A started-and-stopped admission gate.
///
/// Implementations must be safe to share across threads; every method takes
/// `&self`. Acquisition failures, including timeouts, are reported as
/// `false` and are never errors.
///
/// ## Lifecycle
///
/// ```text
///     Created ──start()──► Running ──stop()──► Stopped
///                              ▲                  │
///                              └─────start()──────┘
/// ```
///
/// `start()` on a running limiter and `stop()` on a limiter that is not
/// running are no-ops.
///
/// # Example
///
/// ```rust
/// use bucketeer::{Limiter, TokenBucket};
/// use std::time::Duration;
///
/// fn guarded_call(limiter: &dyn Limiter) -> Option<&'static str> {
///     limiter
///         .take_with_timeout(Duration::from_millis(10))
///         .then_some("done")
/// }
///
/// let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
/// assert_eq!(guarded_call(&bucket), Some("done"));
/// assert_eq!(guarded_call(&bucket), None);
/// ```
pub trait Limiter: Send + Sync + fmt::Debug {
    /// Starts replenishing tokens in the background.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::Spawn`] if the background worker could not
    /// be created. The limiter is then left in its previous state.
    fn start(&self) -> Result<(), LimiterError>;

    /// Stops replenishing tokens. Idempotent.
    ///
    /// Callers parked in [`take`](Self::take) are not woken.
    fn stop(&self);

    /// Takes a token if one is available right now.
    fn try_take(&self) -> bool;

    /// Blocks until a token is available.
    ///
    /// There is no timeout and no way to interrupt the wait. On a limiter
    /// that is never (re)started this blocks forever; prefer
    /// [`take_with_timeout`](Self::take_with_timeout) when that matters.
    fn take(&self);

    /// Blocks until a token is available or `timeout` elapses.
    fn take_with_timeout(&self, timeout: Duration) -> bool;

    /// Returns a consistent snapshot of the attempt counters.
    fn stat(&self) -> BucketStats;

    /// Zeroes the attempt counters and records the reset time.
    fn reset_stat(&self);
}
