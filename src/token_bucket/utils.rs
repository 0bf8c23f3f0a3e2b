//! # Time Helpers (utils.rs)
//!
//! Clock helpers shared by the statistics tracker and the refill task.
//!
//! Wall-clock time is only used for reporting (the reset timestamp in
//! [`BucketStats`](super::BucketStats)). Everything that drives behavior,
//! refill ticks and acquisition deadlines, runs on [`Instant`].

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// Wall-clock epoch captured once, advanced with a monotonic Instant so that
// reported timestamps never go backwards when the system clock is adjusted.
static CLOCK_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current time in milliseconds since the UNIX epoch.
///
/// The value is anchored to the wall clock on first use and then advanced
/// monotonically, so two calls on the same process never decrease.
///
/// # Example
///
/// ```rust
/// use bucketeer::current_time_ms;
///
/// let before = current_time_ms();
/// let after = current_time_ms();
/// assert!(after >= before);
/// ```
#[inline]
pub fn current_time_ms() -> u64 {
    let (anchor, epoch_ms) = CLOCK_BASE.get_or_init(|| {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        (Instant::now(), epoch_ms)
    });
    epoch_ms.saturating_add(anchor.elapsed().as_millis() as u64)
}

/// Returns `now + timeout`, saturating instead of overflowing.
///
/// A timeout too large to represent behaves like "wait forever", which the
/// callers express as `None`.
#[inline]
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}
