//! # Token Store
//!
//! The bounded counting primitive behind every acquisition. One mutex
//! guards the count and one condition variable wakes parked callers.
//!
//! ```text
//!     refill task ──deposit()──►┌─────────────┐
//!                                │ tokens: 2/3 │──try_acquire()──► bool
//!                                │ waiters: 0  │──acquire()──────► (blocks)
//!                                └─────────────┘──acquire_until()► bool
//! ```
//!
//! ## Hand-off
//!
//! A deposit into a full store is normally dropped. The exception is a
//! store with parked waiters and no room: then the token goes straight to
//! one waiter instead of the count. That only happens when the capacity is
//! zero, since waiters only park while the count is zero. Without it a
//! zero-capacity bucket could never admit anyone. Hand-offs are invisible
//! to [`TokenStore::try_acquire`].

use super::cancel::CancellationToken;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};

/// How often a cancellable wait re-checks its token.
pub(crate) const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of [`TokenStore::deposit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deposit {
    /// Added to the count.
    Stored,
    /// Given directly to a parked waiter.
    HandedOff,
    /// Store full and nobody waiting.
    Dropped,
}

#[derive(Debug)]
struct StoreState {
    tokens: u64,
    /// Callers currently parked in `acquire_until`.
    waiters: u64,
    /// Tokens reserved for parked callers, never more than `waiters`.
    handoffs: u64,
}

impl StoreState {
    #[inline]
    fn claim_for_waiter(&mut self) -> bool {
        if self.handoffs > 0 {
            self.handoffs -= 1;
            true
        } else if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Bounded, thread-safe token counter with blocking and timed acquire.
pub(crate) struct TokenStore {
    capacity: u64,
    state: Mutex<StoreState>,
    available: Condvar,
}

impl TokenStore {
    /// Creates a store already holding `capacity` tokens.
    pub(crate) fn full(capacity: u64) -> Self {
        Self {
            capacity,
            state: Mutex::new(StoreState {
                tokens: capacity,
                waiters: 0,
                handoffs: 0,
            }),
            available: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tokens currently in the store.
    pub(crate) fn available(&self) -> u64 {
        self.state.lock().tokens
    }

    /// Number of callers parked waiting for a token.
    pub(crate) fn waiters(&self) -> u64 {
        self.state.lock().waiters
    }

    /// Removes one token if one is present. Never blocks on availability.
    #[inline]
    pub(crate) fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Adds one token without ever blocking.
    pub(crate) fn deposit(&self) -> Deposit {
        let mut state = self.state.lock();

        let outcome = if state.tokens < self.capacity {
            state.tokens += 1;
            Deposit::Stored
        } else if state.waiters > state.handoffs {
            state.handoffs += 1;
            Deposit::HandedOff
        } else {
            return Deposit::Dropped;
        };

        drop(state);
        self.available.notify_one();
        outcome
    }

    /// Parks until a token is taken, `deadline` passes, or `cancel` fires.
    ///
    /// `None` for `deadline` waits without limit. Returns `true` only if a
    /// token was taken.
    pub(crate) fn acquire_until(
        &self,
        deadline: Option<Instant>,
        cancel: Option<&CancellationToken>,
    ) -> bool {
        let mut state = self.state.lock();
        state.waiters += 1;

        let acquired = loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                break false;
            }
            if state.claim_for_waiter() {
                break true;
            }

            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                break false;
            }

            // A cancellable wait wakes periodically to poll its token.
            let poll_at = cancel.map(|_| now + CANCEL_POLL_INTERVAL);
            match (deadline, poll_at) {
                (Some(d), Some(p)) => {
                    self.available.wait_until(&mut state, d.min(p));
                }
                (Some(d), None) | (None, Some(d)) => {
                    self.available.wait_until(&mut state, d);
                }
                (None, None) => self.available.wait(&mut state),
            }
        };

        state.waiters -= 1;
        if !acquired && state.handoffs > 0 {
            // A hand-off may have been reserved for this caller. Pass it to
            // a remaining waiter or drop it.
            state.handoffs = state.handoffs.min(state.waiters);
            if state.handoffs > 0 {
                drop(state);
                self.available.notify_one();
            }
        }
        acquired
    }

    /// Parks until a token is taken. Cannot be interrupted.
    pub(crate) fn acquire(&self) {
        // Only returns false on deadline or cancellation, neither given.
        let _ = self.acquire_until(None, None);
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TokenStore")
            .field("capacity", &self.capacity)
            .field("tokens", &state.tokens)
            .field("waiters", &state.waiters)
            .finish()
    }
}
