//! Error types.
//!
//! Acquisition failures are plain `false` results and never show up here.
//! These errors only cover strict configuration checks and the one
//! operating-system failure the bucket can hit: spawning its refill thread.

use thiserror::Error;

/// Rejected configuration, returned by [`TokenBucketConfig::validate`] and
/// [`TokenBucketBuilder::try_build`](crate::TokenBucketBuilder::try_build).
///
/// The regular constructors never return this. They correct the same
/// inputs instead (see [`TokenBucketConfig::normalized`]).
///
/// [`TokenBucketConfig::validate`]: super::TokenBucketConfig::validate
/// [`TokenBucketConfig::normalized`]: super::TokenBucketConfig::normalized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Capacity below zero.
    #[error("invalid capacity: must be zero or greater, got {0}")]
    NegativeCapacity(i64),

    /// Rate of zero or less tokens per window.
    #[error("invalid rate: must be positive, got {0}")]
    NonPositiveRate(i64),

    /// Refill window of zero length.
    #[error("invalid window: must be longer than zero")]
    ZeroWindow,
}

/// Failure of a lifecycle operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LimiterError {
    /// The refill thread could not be spawned.
    #[error("failed to spawn refill thread: {0}")]
    Spawn(#[from] std::io::Error),
}
