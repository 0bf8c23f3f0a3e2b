//! # Token Bucket Module
//!
//! Internal implementation of the limiter, split by concern.
//!
//! ## Module Structure
//!
//! ```text
//!     token_bucket/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── limiter.rs      (The Limiter contract)
//!     ├── core.rs         (TokenBucket: lifecycle + acquisition)
//!     ├── refill.rs       (Background refill thread)
//!     ├── store.rs        (Bounded token counter, blocking/timed acquire)
//!     ├── stats.rs        (Attempt counters and snapshots)
//!     ├── config.rs       (Parameters and normalization)
//!     ├── cancel.rs       (Cancellation for blocking waits)
//!     ├── error.rs        (Error types)
//!     └── utils.rs        (Clock helpers)
//! ```
//!
//! ## Dependency Order
//!
//! ```text
//!     store ──► stats ──► refill ──► core (implements limiter)
//! ```

mod cancel;
mod config;
mod core;
mod error;
mod limiter;
mod refill;
mod stats;
mod store;
mod utils;

/// Cancellation for blocking acquisitions
pub use cancel::CancellationToken;

/// Parameters, their defaults and normalization rules
pub use config::{TokenBucketConfig, DEFAULT_WINDOW, MIN_REFILL_INTERVAL};

/// The concrete bucket and its lifecycle states
pub use self::core::{RunState, TokenBucket};

/// Errors from strict validation and lifecycle operations
pub use error::{ConfigError, LimiterError};

/// The limiter contract
pub use limiter::Limiter;

/// Statistics snapshot
pub use stats::BucketStats;

/// Clock helper used for reset timestamps
pub use utils::current_time_ms;
