//! # Token Bucket Configuration
//!
//! The three numbers that define a bucket and the rules for cleaning them
//! up.
//!
//! ```text
//!     Token Bucket Configuration:
//!
//!     ┌──────────────────────────────┐
//!     │   Capacity                   │ ← Burst limit
//!     │   ┌─────────────────────┐    │
//!     │   │ ● ● ● ● ●           │    │ ← Available tokens
//!     │   └─────────────────────┘    │
//!     │                              │
//!     │   Rate:   5 tokens           │ ┐
//!     │   Window: 1000ms             │ ┘ one token every 200ms
//!     └──────────────────────────────┘
//! ```
//!
//! `rate` and `window` are only used to derive the refill interval,
//! `window / rate`. The refill task deposits exactly one token per interval.
//!
//! ## Normalization
//!
//! | Input              | Becomes      |
//! |--------------------|--------------|
//! | `capacity < 0`     | `0`          |
//! | `rate <= 0`        | `1`          |
//! | `window == 0`      | 1 second     |
//! | `window / rate==0` | 1 nanosecond |

use super::error::ConfigError;
use std::time::Duration;
use tracing::debug;

/// Window used when the configured one is empty.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Smallest refill interval a bucket will tick at.
pub const MIN_REFILL_INTERVAL: Duration = Duration::from_nanos(1);

/// Configuration for a [`TokenBucket`](super::TokenBucket).
///
/// Fields are signed so that out-of-range input can be represented and
/// corrected rather than rejected at the type level.
///
/// ## Examples
///
/// ```rust
/// use bucketeer::TokenBucketConfig;
/// use std::time::Duration;
///
/// // 10 tokens per second, burst of 10
/// let config = TokenBucketConfig::per_second(10);
/// assert_eq!(config.refill_interval(), Duration::from_millis(100));
///
/// // 2 tokens every 4 seconds, burst of 5
/// let config = TokenBucketConfig::new(5, 2, Duration::from_secs(4));
/// assert_eq!(config.refill_interval(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketConfig {
    /// Maximum tokens held at once (burst allowance).
    pub capacity: i64,

    /// Tokens deposited per `window`.
    pub rate: i64,

    /// Span of time over which `rate` tokens are deposited.
    pub window: Duration,
}

impl Default for TokenBucketConfig {
    /// 10 tokens per second with a burst of 10.
    fn default() -> Self {
        Self {
            capacity: 10,
            rate: 10,
            window: DEFAULT_WINDOW,
        }
    }
}

impl TokenBucketConfig {
    /// Creates a configuration from raw parameters.
    ///
    /// Nothing is checked here; see [`normalized`](Self::normalized) and
    /// [`validate`](Self::validate).
    pub fn new(capacity: i64, rate: i64, window: Duration) -> Self {
        Self {
            capacity,
            rate,
            window,
        }
    }

    /// `rate` tokens per second, burst capacity equal to the rate.
    pub fn per_second(rate: i64) -> Self {
        Self::new(rate, rate, Duration::from_secs(1))
    }

    /// `rate` tokens per minute, burst capacity equal to the rate.
    pub fn per_minute(rate: i64) -> Self {
        Self::new(rate, rate, Duration::from_secs(60))
    }

    /// Overrides the burst capacity.
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the burst capacity to `multiplier` times the rate.
    ///
    /// ```rust
    /// use bucketeer::TokenBucketConfig;
    ///
    /// let config = TokenBucketConfig::per_second(10).with_burst_multiplier(5);
    /// assert_eq!(config.capacity, 50);
    /// ```
    pub fn with_burst_multiplier(mut self, multiplier: i64) -> Self {
        self.capacity = self.rate.saturating_mul(multiplier);
        self
    }

    /// Checks the configuration without correcting anything.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NegativeCapacity`] if `capacity < 0`
    /// - [`ConfigError::NonPositiveRate`] if `rate <= 0`
    /// - [`ConfigError::ZeroWindow`] if `window` is zero
    ///
    /// A zero capacity is valid: such a bucket only admits callers that are
    /// already parked waiting when a refill tick fires.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 0 {
            return Err(ConfigError::NegativeCapacity(self.capacity));
        }
        if self.rate <= 0 {
            return Err(ConfigError::NonPositiveRate(self.rate));
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    /// Returns a copy with every out-of-range field corrected.
    ///
    /// ```rust
    /// use bucketeer::TokenBucketConfig;
    /// use std::time::Duration;
    ///
    /// let fixed = TokenBucketConfig::new(-5, 0, Duration::ZERO).normalized();
    /// assert_eq!(fixed, TokenBucketConfig::new(0, 1, Duration::from_secs(1)));
    /// ```
    pub fn normalized(&self) -> Self {
        let mut fixed = self.clone();

        if fixed.capacity < 0 {
            debug!("Normalizing capacity {} to 0", fixed.capacity);
            fixed.capacity = 0;
        }
        if fixed.rate <= 0 {
            debug!("Normalizing rate {} to 1", fixed.rate);
            fixed.rate = 1;
        }
        if fixed.window.is_zero() {
            debug!("Normalizing empty window to {:?}", DEFAULT_WINDOW);
            fixed.window = DEFAULT_WINDOW;
        }

        fixed
    }

    /// Capacity after normalization.
    pub fn effective_capacity(&self) -> u64 {
        self.capacity.max(0) as u64
    }

    /// Time between two refill deposits, `window / rate`, after
    /// normalization. Always strictly positive.
    pub fn refill_interval(&self) -> Duration {
        let rate = self.rate.max(1) as u128;
        let window = if self.window.is_zero() {
            DEFAULT_WINDOW
        } else {
            self.window
        };

        let nanos = window.as_nanos() / rate;
        let nanos = u64::try_from(nanos).unwrap_or(u64::MAX);
        Duration::from_nanos(nanos).max(MIN_REFILL_INTERVAL)
    }

    /// Sustained admission rate in tokens per second.
    ///
    /// ```rust
    /// use bucketeer::TokenBucketConfig;
    /// use std::time::Duration;
    ///
    /// let config = TokenBucketConfig::new(10, 30, Duration::from_secs(60));
    /// assert_eq!(config.effective_rate_per_second(), 0.5);
    /// ```
    pub fn effective_rate_per_second(&self) -> f64 {
        1.0 / self.refill_interval().as_secs_f64()
    }
}
