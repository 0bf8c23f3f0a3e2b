//! Cooperative cancellation for blocking acquisitions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag that aborts [`TokenBucket::take_cancellable`].
///
/// All clones share the same flag. Cancelling is permanent; create a new
/// token for the next wait.
///
/// ```rust
/// use bucketeer::{CancellationToken, TokenBucket};
/// use std::time::Duration;
///
/// let bucket = TokenBucket::new(0, 1, Duration::from_secs(60));
/// let token = CancellationToken::new();
/// token.cancel();
///
/// assert!(!bucket.take_cancellable(&token));
/// ```
///
/// [`TokenBucket::take_cancellable`]: super::TokenBucket::take_cancellable
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every wait observing this token or one of its clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
