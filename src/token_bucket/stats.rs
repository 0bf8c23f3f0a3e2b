//! # Acquisition Statistics
//!
//! Counts admission decisions so callers can watch how hard a bucket is
//! throttling.
//!
//! ```text
//!     Statistics Snapshot:
//!     ┌─────────────────────────────────────┐
//!     │  Total Requests:   4                │
//!     │  Blocked Requests: 1                │
//!     │  Success Rate:     75.00%           │
//!     │  ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓░░░░░               │
//!     └─────────────────────────────────────┘
//! ```
//!
//! Every counter lives behind one lock. A snapshot, a reset and each
//! recorded attempt are all single critical sections, so a snapshot can
//! never show a blocked count without its matching total.

use super::utils::current_time_ms;
use parking_lot::Mutex;
use std::fmt;

#[derive(Debug)]
struct StatsInner {
    total_requests: u64,
    blocked_requests: u64,
    last_reset_ms: u64,
}

/// Lock-protected attempt counters owned by a bucket.
#[derive(Debug)]
pub(crate) struct StatsTracker {
    inner: Mutex<StatsInner>,
}

impl StatsTracker {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(StatsInner {
                total_requests: 0,
                blocked_requests: 0,
                last_reset_ms: current_time_ms(),
            }),
        }
    }

    /// Records one acquisition attempt and its outcome.
    #[inline]
    pub(crate) fn record(&self, admitted: bool) {
        let mut inner = self.inner.lock();
        inner.total_requests = inner.total_requests.saturating_add(1);
        if !admitted {
            inner.blocked_requests = inner.blocked_requests.saturating_add(1);
        }
    }

    pub(crate) fn snapshot(&self) -> BucketStats {
        let inner = self.inner.lock();
        BucketStats::from_counts(
            inner.total_requests,
            inner.blocked_requests,
            inner.last_reset_ms,
        )
    }

    pub(crate) fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.total_requests = 0;
        inner.blocked_requests = 0;
        inner.last_reset_ms = current_time_ms();
    }
}

/// A consistent snapshot of a bucket's acquisition statistics.
///
/// ## Example
///
/// ```rust
/// use bucketeer::TokenBucket;
/// use std::time::Duration;
///
/// let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
/// bucket.try_take();
/// bucket.try_take();
///
/// let stats = bucket.stat();
/// assert_eq!(stats.total_requests, 2);
/// assert_eq!(stats.blocked_requests, 1);
/// assert_eq!(stats.success_rate, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStats {
    /// Acquisition attempts since the last reset.
    pub total_requests: u64,

    /// Attempts that did not get a token.
    pub blocked_requests: u64,

    /// Percentage of attempts that got a token, `0.0` to `100.0`.
    /// `0.0` when there were no attempts.
    pub success_rate: f64,

    /// Epoch milliseconds of the last reset, or of construction.
    pub last_reset_ms: u64,
}

impl BucketStats {
    pub(crate) fn from_counts(total: u64, blocked: u64, last_reset_ms: u64) -> Self {
        let success_rate = if total == 0 {
            0.0
        } else {
            100.0 * (total - blocked) as f64 / total as f64
        };

        Self {
            total_requests: total,
            blocked_requests: blocked,
            success_rate,
            last_reset_ms,
        }
    }

    /// Attempts that got a token.
    #[inline]
    pub fn admitted(&self) -> u64 {
        self.total_requests - self.blocked_requests
    }

    /// Percentage of attempts that were blocked. `0.0` with no attempts.
    #[inline]
    pub fn rejection_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            100.0 - self.success_rate
        }
    }

    /// Returns the snapshot as the `(total, blocked, success_rate)` triple.
    #[inline]
    pub fn as_tuple(&self) -> (u64, u64, f64) {
        (self.total_requests, self.blocked_requests, self.success_rate)
    }

    /// Human-readable report, suitable for logs.
    ///
    /// ```text
    /// TokenBucket Stats:
    /// ├─ Total Requests: 4
    /// ├─ Admitted: 3
    /// ├─ Blocked: 1
    /// ├─ Success Rate: 75.00%
    /// └─ Last Reset: 1718000000000ms
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "TokenBucket Stats:\n\
             ├─ Total Requests: {}\n\
             ├─ Admitted: {}\n\
             ├─ Blocked: {}\n\
             ├─ Success Rate: {:.2}%\n\
             └─ Last Reset: {}ms",
            self.total_requests,
            self.admitted(),
            self.blocked_requests,
            self.success_rate,
            self.last_reset_ms
        )
    }
}

impl fmt::Display for BucketStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_success_rate_math() {
        let stats = BucketStats::from_counts(4, 1, 0);
        assert_eq!(stats.as_tuple(), (4, 1, 75.0));
        assert_eq!(stats.admitted(), 3);
        assert_eq!(stats.rejection_rate(), 25.0);
    }

    #[test]
    fn test_zero_total() {
        let stats = BucketStats::from_counts(0, 0, 0);
        assert_eq!(stats.as_tuple(), (0, 0, 0.0));
        assert_eq!(stats.rejection_rate(), 0.0);
    }

    #[test]
    fn test_all_blocked() {
        let stats = BucketStats::from_counts(5, 5, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.rejection_rate(), 100.0);
    }

    #[test]
    fn test_tracker_records_and_resets() {
        let tracker = StatsTracker::new();
        tracker.record(true);
        tracker.record(true);
        tracker.record(false);

        let before = tracker.snapshot();
        assert_eq!(before.as_tuple().0, 3);
        assert_eq!(before.blocked_requests, 1);

        std::thread::sleep(std::time::Duration::from_millis(5));
        tracker.reset();

        let after = tracker.snapshot();
        assert_eq!(after.as_tuple(), (0, 0, 0.0));
        assert!(after.last_reset_ms > before.last_reset_ms);
    }

    #[test]
    fn test_blocked_never_exceeds_total_under_contention() {
        let tracker = Arc::new(StatsTracker::new());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for n in 0..1_000 {
                        tracker.record((n + i) % 3 != 0);
                    }
                })
            })
            .collect();

        for _ in 0..200 {
            let stats = tracker.snapshot();
            assert!(stats.blocked_requests <= stats.total_requests);
        }

        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(tracker.snapshot().total_requests, 8_000);
    }

    #[test]
    fn test_display() {
        let stats = BucketStats::from_counts(10, 2, 42);
        let display = format!("{}", stats);
        assert!(display.contains("TokenBucket Stats"));
        assert!(display.contains("Success Rate: 80.00%"));
        assert!(display.contains("Blocked: 2"));
        assert_eq!(display, stats.summary());
    }
}
