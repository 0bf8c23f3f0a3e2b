//! # Bucketeer - Token Bucket Rate Limiter
//!
//! A thread-safe token bucket that admits bursts up to a fixed capacity and
//! refills one token at a steady interval from a background thread.
//!
//! ## The Token Bucket Algorithm
//!
//! ```text
//!     capacity = 3, rate = 1 per second
//!
//!     t=0.0s  start     [● ● ●]
//!     t=0.1s  take ✅   [● ● ○]
//!     t=0.2s  take ✅   [● ○ ○]
//!     t=0.3s  take ✅   [○ ○ ○]
//!     t=0.4s  take ❌   [○ ○ ○]
//!     t=1.0s  refill    [● ○ ○]
//!     t=1.1s  take ✅   [○ ○ ○]
//! ```
//!
//! - **Token**: one permission to proceed
//! - **Capacity**: the burst allowance, the most tokens held at once
//! - **Refill interval**: `window / rate`, the time between two deposits
//!
//! ## Quick Start
//!
//! ```rust
//! use bucketeer::TokenBucket;
//! use std::time::Duration;
//!
//! // Burst of 2, one token per second afterwards.
//! let bucket = TokenBucket::new(2, 1, Duration::from_secs(1));
//! bucket.start().unwrap();
//!
//! if bucket.try_take() {
//!     println!("✅ Request admitted");
//! } else {
//!     println!("⛔ Throttled");
//! }
//!
//! // Wait up to 50ms for a token instead of failing immediately.
//! let admitted = bucket.take_with_timeout(Duration::from_millis(50));
//! # assert!(admitted);
//!
//! let stats = bucket.stat();
//! println!("{} attempts, {:.1}% admitted", stats.total_requests, stats.success_rate);
//!
//! bucket.stop();
//! ```
//!
//! ## Builder
//!
//! ```rust
//! use bucketeer::TokenBucketBuilder;
//! use std::time::Duration;
//!
//! let bucket = TokenBucketBuilder::new()
//!     .capacity(100)
//!     .rate(20)
//!     .window(Duration::from_secs(1))
//!     .build();
//! assert_eq!(bucket.refill_interval(), Duration::from_millis(50));
//!
//! // Strict mode rejects what `build()` would silently correct.
//! assert!(TokenBucketBuilder::new().rate(0).try_build().is_err());
//! ```
//!
//! ## Lifecycle
//!
//! A bucket is created full and idle. [`TokenBucket::start`] spawns the
//! refill thread, [`TokenBucket::stop`] joins it. Both are safe to repeat.
//! Dropping a bucket stops it.
//!
//! ## Blocking Caveat
//!
//! [`TokenBucket::take`] waits without limit and `stop()` does not wake it.
//! Prefer [`TokenBucket::take_with_timeout`] or
//! [`TokenBucket::take_cancellable`] when a wait has to end.
//!
//! ## Thread Safety
//!
//! Every operation takes `&self`. Share a bucket with `Arc<TokenBucket>`
//! ([`SharedTokenBucket`]).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod token_bucket;

pub use token_bucket::{
    current_time_ms, BucketStats, CancellationToken, ConfigError, Limiter, LimiterError,
    RunState, TokenBucket, TokenBucketConfig, DEFAULT_WINDOW, MIN_REFILL_INTERVAL,
};

use std::time::Duration;

/// A token bucket wrapped in `Arc` for sharing across threads.
///
/// ```rust
/// use bucketeer::{SharedTokenBucket, TokenBucket};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let shared: SharedTokenBucket = Arc::new(TokenBucket::new(10, 10, Duration::from_secs(1)));
/// let worker = shared.clone();
/// std::thread::spawn(move || worker.try_take()).join().unwrap();
/// ```
pub type SharedTokenBucket = std::sync::Arc<TokenBucket>;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports.
///
/// ```rust
/// use bucketeer::prelude::*;
///
/// let bucket = TokenBucket::with_config(TokenBucketConfig::per_second(5));
/// assert!(bucket.try_take());
/// ```
pub mod prelude {
    pub use crate::{
        BucketStats, CancellationToken, Limiter, RunState, SharedTokenBucket, TokenBucket,
        TokenBucketBuilder, TokenBucketConfig,
    };
}

/// Fluent construction of a [`TokenBucket`].
///
/// Starts from [`TokenBucketConfig::default`]: capacity 10, 10 tokens per
/// second.
#[derive(Debug, Clone, Default)]
pub struct TokenBucketBuilder {
    config: TokenBucketConfig,
}

impl TokenBucketBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the burst capacity.
    pub fn capacity(mut self, capacity: i64) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the tokens deposited per window.
    pub fn rate(mut self, rate: i64) -> Self {
        self.config.rate = rate;
        self
    }

    /// Sets the span over which `rate` tokens are deposited.
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Builds the bucket, correcting any out-of-range parameter.
    pub fn build(self) -> TokenBucket {
        TokenBucket::with_config(self.config)
    }

    /// Builds the bucket only if every parameter is already valid.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found by [`TokenBucketConfig::validate`].
    pub fn try_build(self) -> Result<TokenBucket, ConfigError> {
        self.config.validate()?;
        Ok(TokenBucket::with_config(self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_functionality() {
        let bucket = TokenBucket::new(10, 1, Duration::from_secs(1));

        for _ in 0..10 {
            assert!(bucket.try_take());
        }
        assert!(!bucket.try_take());

        let stats = bucket.stat();
        assert_eq!(stats.total_requests, 11);
        assert_eq!(stats.blocked_requests, 1);
    }

    #[test]
    fn test_builder() {
        let bucket = TokenBucketBuilder::new()
            .capacity(50)
            .rate(5)
            .window(Duration::from_secs(1))
            .build();

        assert_eq!(bucket.available_tokens(), 50);
        assert_eq!(bucket.refill_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_builder_normalizes() {
        let bucket = TokenBucketBuilder::new().capacity(-5).rate(-5).build();
        assert_eq!(bucket.capacity(), 0);
        assert_eq!(bucket.refill_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_validation() {
        let err = TokenBucketBuilder::new().capacity(-1).try_build().unwrap_err();
        assert_eq!(err, ConfigError::NegativeCapacity(-1));

        let err = TokenBucketBuilder::new()
            .window(Duration::ZERO)
            .try_build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroWindow);

        assert!(TokenBucketBuilder::default().try_build().is_ok());
    }

    #[test]
    fn test_thread_safety() {
        let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(1000, 1, Duration::from_secs(60)));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let bucket = bucket.clone();
                thread::spawn(move || (0..200).filter(|_| bucket.try_take()).count())
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1000);

        let stats = bucket.stat();
        assert_eq!(stats.total_requests, 2000);
        assert_eq!(stats.blocked_requests, 1000);
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let bucket = TokenBucketBuilder::new().build();
        let _state: RunState = bucket.state();
        let _token = CancellationToken::new();
        let _stats: BucketStats = Limiter::stat(&bucket);
        let _config = TokenBucketConfig::per_minute(60);
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
