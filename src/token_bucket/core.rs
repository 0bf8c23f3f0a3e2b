//! # Token Bucket
//!
//! The one concrete [`Limiter`]. It ties the token store, the refill task
//! and the statistics tracker together behind a single `&self` API.
//!
//! ```text
//!     TokenBucket
//!     ├─ store: Arc<TokenStore>    ◄── shared with the refill thread
//!     ├─ stats: StatsTracker       ◄── attempts / blocked / last reset
//!     └─ lifecycle: Mutex<…>       ◄── RunState + refill handle
//! ```
//!
//! ## Acquisition Modes
//!
//! | Method                | Blocks?                 | Counts in stats |
//! |-----------------------|-------------------------|-----------------|
//! | `try_take()`          | never                   | yes             |
//! | `take()`              | until a token arrives   | yes (admitted)  |
//! | `take_with_timeout()` | up to the timeout       | yes             |
//! | `take_cancellable()`  | until token or cancel   | yes             |

use super::{
    cancel::CancellationToken,
    config::TokenBucketConfig,
    error::LimiterError,
    limiter::Limiter,
    refill::RefillTask,
    stats::{BucketStats, StatsTracker},
    store::TokenStore,
    utils::deadline_after,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Lifecycle state of a [`TokenBucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, never started.
    Created,
    /// Refill thread running.
    Running,
    /// Refill thread stopped; may be started again.
    Stopped,
}

#[derive(Debug)]
struct Lifecycle {
    state: RunState,
    refill: Option<RefillTask>,
}

/// Thread-safe token bucket with a background refill thread.
///
/// A new bucket holds `capacity` tokens and does not refill until
/// [`start`](Self::start) is called. Once running, one token is deposited
/// every `window / rate`; tokens arriving at a full bucket are dropped.
///
/// Dropping the bucket stops its refill thread.
///
/// ## Example
///
/// ```rust
/// use bucketeer::TokenBucket;
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// // Burst of 5, then one token every 100ms.
/// let bucket = Arc::new(TokenBucket::new(5, 10, Duration::from_secs(1)));
/// bucket.start().unwrap();
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let bucket = bucket.clone();
///         thread::spawn(move || bucket.take_with_timeout(Duration::from_secs(1)))
///     })
///     .collect();
///
/// for worker in workers {
///     assert!(worker.join().unwrap());
/// }
/// bucket.stop();
/// ```
pub struct TokenBucket {
    store: Arc<TokenStore>,
    refill_interval: Duration,
    stats: StatsTracker,
    lifecycle: Mutex<Lifecycle>,
}

impl TokenBucket {
    /// Creates a stopped bucket holding `capacity` tokens.
    ///
    /// Never fails: out-of-range input is corrected as described in
    /// [`TokenBucketConfig::normalized`].
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum tokens held at once (burst allowance)
    /// * `rate` - Tokens deposited per `window`
    /// * `window` - Span over which `rate` tokens are deposited
    ///
    /// # Example
    ///
    /// ```rust
    /// use bucketeer::TokenBucket;
    /// use std::time::Duration;
    ///
    /// let bucket = TokenBucket::new(2, 1, Duration::from_secs(1));
    /// assert_eq!(bucket.capacity(), 2);
    /// assert_eq!(bucket.refill_interval(), Duration::from_secs(1));
    ///
    /// let corrected = TokenBucket::new(-3, 0, Duration::ZERO);
    /// assert_eq!(corrected.capacity(), 0);
    /// assert_eq!(corrected.refill_interval(), Duration::from_secs(1));
    /// ```
    pub fn new(capacity: i64, rate: i64, window: Duration) -> Self {
        Self::with_config(TokenBucketConfig::new(capacity, rate, window))
    }

    /// Creates a stopped bucket from a configuration, normalizing it first.
    pub fn with_config(config: TokenBucketConfig) -> Self {
        let config = config.normalized();
        let capacity = config.effective_capacity();
        let refill_interval = config.refill_interval();

        debug!(
            "Created token bucket (capacity: {}, refill interval: {:?})",
            capacity, refill_interval
        );

        Self {
            store: Arc::new(TokenStore::full(capacity)),
            refill_interval,
            stats: StatsTracker::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: RunState::Created,
                refill: None,
            }),
        }
    }

    /// Spawns the refill thread.
    ///
    /// A no-op on a running bucket. On a stopped bucket it resumes
    /// refilling; the current tokens and statistics are kept.
    ///
    /// # Errors
    ///
    /// [`LimiterError::Spawn`] if the thread could not be created. The run
    /// state is unchanged in that case.
    pub fn start(&self) -> Result<(), LimiterError> {
        let mut lifecycle = self.lifecycle.lock();

        if lifecycle.state == RunState::Running {
            debug!("Token bucket already running, start ignored");
            return Ok(());
        }

        let task = RefillTask::spawn(self.store.clone(), self.refill_interval)?;
        lifecycle.refill = Some(task);
        lifecycle.state = RunState::Running;
        Ok(())
    }

    /// Stops the refill thread and waits for it to exit.
    ///
    /// Safe to call any number of times, including before `start`.
    /// Callers parked in [`take`](Self::take) stay parked.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();

        if lifecycle.state != RunState::Running {
            debug!("Token bucket not running ({:?}), stop ignored", lifecycle.state);
            return;
        }

        lifecycle.state = RunState::Stopped;
        if let Some(task) = lifecycle.refill.take() {
            task.stop();
        }
    }

    /// Takes a token if one is available right now. Never blocks.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bucketeer::TokenBucket;
    /// use std::time::Duration;
    ///
    /// let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
    /// assert!(bucket.try_take());
    /// assert!(!bucket.try_take());
    /// ```
    #[inline]
    pub fn try_take(&self) -> bool {
        let admitted = self.store.try_acquire();
        self.stats.record(admitted);
        admitted
    }

    /// Blocks until a token is available.
    ///
    /// This wait cannot be interrupted, and [`stop`](Self::stop) does not
    /// end it: on a bucket that is not running and has no tokens it never
    /// returns. Use [`take_with_timeout`](Self::take_with_timeout) or
    /// [`take_cancellable`](Self::take_cancellable) for a bounded wait.
    pub fn take(&self) {
        self.store.acquire();
        self.stats.record(true);
    }

    /// Blocks until a token is available or `timeout` elapses.
    ///
    /// Returns `false` on timeout. A zero timeout behaves like
    /// [`try_take`](Self::try_take), except that on a zero-capacity bucket it
    /// can still receive a token handed off by the refill thread.
    pub fn take_with_timeout(&self, timeout: Duration) -> bool {
        let admitted = self.store.acquire_until(deadline_after(timeout), None);
        self.stats.record(admitted);
        admitted
    }

    /// Blocks until a token is available or `token` is cancelled.
    ///
    /// Returns `false` if cancelled, without taking a token. Cancelling does
    /// not wake the caller directly: the wait polls `token` every 10ms, so
    /// cancellation is noticed within that interval.
    pub fn take_cancellable(&self, token: &CancellationToken) -> bool {
        let admitted = self.store.acquire_until(None, Some(token));
        self.stats.record(admitted);
        admitted
    }

    /// Returns a snapshot of the attempt counters.
    pub fn stat(&self) -> BucketStats {
        self.stats.snapshot()
    }

    /// Zeroes the attempt counters.
    pub fn reset_stat(&self) {
        self.stats.reset();
        debug!("Token bucket statistics reset");
    }

    /// Tokens currently available to `try_take`.
    pub fn available_tokens(&self) -> u64 {
        self.store.available()
    }

    /// Callers currently parked in `take`, `take_with_timeout` or
    /// `take_cancellable`.
    pub fn waiting_callers(&self) -> u64 {
        self.store.waiters()
    }

    /// Maximum tokens held at once.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.store.capacity()
    }

    /// Time between refill deposits.
    #[inline]
    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.lifecycle.lock().state
    }

    /// Returns `true` while the refill thread is running.
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }
}

impl Limiter for TokenBucket {
    fn start(&self) -> Result<(), LimiterError> {
        TokenBucket::start(self)
    }

    fn stop(&self) {
        TokenBucket::stop(self)
    }

    fn try_take(&self) -> bool {
        TokenBucket::try_take(self)
    }

    fn take(&self) {
        TokenBucket::take(self)
    }

    fn take_with_timeout(&self, timeout: Duration) -> bool {
        TokenBucket::take_with_timeout(self, timeout)
    }

    fn stat(&self) -> BucketStats {
        TokenBucket::stat(self)
    }

    fn reset_stat(&self) {
        TokenBucket::reset_stat(self)
    }
}

impl Drop for TokenBucket {
    fn drop(&mut self) {
        if let Some(task) = self.lifecycle.get_mut().refill.take() {
            task.stop();
        }
    }
}

impl fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity())
            .field("refill_interval", &self.refill_interval)
            .field("available_tokens", &self.available_tokens())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_new_bucket_is_full_and_created() {
        let bucket = TokenBucket::new(3, 1, Duration::from_secs(1));
        assert_eq!(bucket.available_tokens(), 3);
        assert_eq!(bucket.state(), RunState::Created);
        assert!(!bucket.is_running());
    }

    #[test]
    fn test_try_take_drains_capacity() {
        let bucket = TokenBucket::new(4, 1, Duration::from_secs(60));
        bucket.start().unwrap();

        for _ in 0..4 {
            assert!(bucket.try_take());
        }
        assert!(!bucket.try_take());
        bucket.stop();
    }

    #[test]
    fn test_normalization() {
        let bucket = TokenBucket::new(-1, -1, Duration::ZERO);
        assert_eq!(bucket.capacity(), 0);
        assert_eq!(bucket.refill_interval(), Duration::from_secs(1));
        assert!(!bucket.try_take());
    }

    #[test]
    fn test_start_twice_is_noop() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(60));
        bucket.start().unwrap();
        bucket.start().unwrap();
        assert_eq!(bucket.state(), RunState::Running);

        bucket.stop();
        assert_eq!(bucket.state(), RunState::Stopped);
    }

    #[test]
    fn test_stop_without_start() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
        bucket.stop();
        bucket.stop();
        assert_eq!(bucket.state(), RunState::Created);
    }

    #[test]
    fn test_double_stop() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
        bucket.start().unwrap();
        bucket.stop();
        bucket.stop();
        assert_eq!(bucket.state(), RunState::Stopped);
    }

    #[test]
    fn test_restart_after_stop_refills() {
        let bucket = TokenBucket::new(1, 1, Duration::from_millis(50));
        bucket.start().unwrap();
        bucket.stop();

        assert!(bucket.try_take());
        thread::sleep(Duration::from_millis(120));
        assert!(!bucket.try_take(), "stopped bucket must not refill");

        bucket.start().unwrap();
        assert!(bucket.is_running());
        assert!(bucket.take_with_timeout(Duration::from_secs(1)));
        bucket.stop();
    }

    #[test]
    fn test_refill_after_interval() {
        let bucket = TokenBucket::new(2, 1, Duration::from_millis(100));
        bucket.start().unwrap();

        assert!(bucket.try_take());
        assert!(bucket.try_take());
        assert!(!bucket.try_take());

        thread::sleep(Duration::from_millis(250));
        assert_eq!(bucket.available_tokens(), 2);
        bucket.stop();
    }

    #[test]
    fn test_take_blocks_until_refill() {
        let bucket = TokenBucket::new(1, 1, Duration::from_millis(100));
        bucket.start().unwrap();
        assert!(bucket.try_take());

        let start = Instant::now();
        bucket.take();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(50), "waited {:?}", waited);
        bucket.stop();
    }

    #[test]
    fn test_take_with_timeout_expires() {
        let bucket = TokenBucket::new(0, 1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(!bucket.take_with_timeout(Duration::from_millis(100)));

        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_millis(300));
    }

    #[test]
    fn test_take_cancellable() {
        let bucket = Arc::new(TokenBucket::new(0, 1, Duration::from_secs(60)));
        let token = CancellationToken::new();

        let waiter = {
            let bucket = bucket.clone();
            let token = token.clone();
            thread::spawn(move || bucket.take_cancellable(&token))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();
        assert!(!waiter.join().unwrap());

        let stats = bucket.stat();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.blocked_requests, 1);
    }

    #[test]
    fn test_all_modes_are_counted() {
        let bucket = TokenBucket::new(2, 1, Duration::from_secs(60));
        assert!(bucket.try_take());
        bucket.take();
        assert!(!bucket.take_with_timeout(Duration::from_millis(10)));
        assert!(!bucket.try_take());

        let stats = bucket.stat();
        assert_eq!(stats.as_tuple(), (4, 2, 50.0));
    }

    #[test]
    fn test_reset_stat() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(1));
        bucket.try_take();
        bucket.try_take();
        bucket.reset_stat();
        assert_eq!(bucket.stat().as_tuple(), (0, 0, 0.0));
    }

    #[test]
    fn test_zero_capacity_hands_off_to_waiter() {
        let bucket = Arc::new(TokenBucket::new(0, 1, Duration::from_millis(50)));
        bucket.start().unwrap();

        thread::sleep(Duration::from_millis(120));
        assert!(!bucket.try_take());

        assert!(bucket.take_with_timeout(Duration::from_secs(1)));
        bucket.stop();
    }

    #[test]
    fn test_drop_stops_refill_thread() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(60));
        bucket.start().unwrap();

        let start = Instant::now();
        drop(bucket);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let bucket: Box<dyn Limiter> = Box::new(TokenBucket::new(1, 1, Duration::from_secs(1)));
        bucket.start().unwrap();
        assert!(bucket.try_take());
        assert!(!bucket.try_take());
        assert_eq!(bucket.stat().blocked_requests, 1);
        bucket.stop();
    }

    #[test]
    fn test_debug_impl() {
        let bucket = TokenBucket::new(10, 5, Duration::from_secs(1));
        let debug = format!("{:?}", bucket);

        assert!(debug.contains("TokenBucket"));
        assert!(debug.contains("capacity: 10"));
        assert!(debug.contains("Created"));
    }
}
