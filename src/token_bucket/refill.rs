//! # Refill Task
//!
//! One named background thread per running bucket. It deposits a single
//! token per tick and exits as soon as it sees the stop signal.
//!
//! ```text
//!     Refill loop:
//!
//!     ┌──► recv_timeout(until next tick) ──Stop/Disconnected──► exit
//!     │             │
//!     │          Timeout
//!     │             ▼
//!     │     store.deposit() ──► Stored | HandedOff | Dropped
//!     │             │
//!     └──── schedule next tick (skip missed ones)
//! ```
//!
//! Waiting on the stop channel instead of sleeping means a stop request is
//! seen immediately rather than after the current tick.

use super::store::{Deposit, TokenStore};
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Name given to every refill thread.
pub(crate) const REFILL_THREAD_NAME: &str = "bucketeer-refill";

/// Handle to a running refill thread.
#[derive(Debug)]
pub(crate) struct RefillTask {
    handle: thread::JoinHandle<()>,
    stop_tx: mpsc::Sender<()>,
}

impl RefillTask {
    /// Spawns the refill thread for `store`, ticking every `interval`.
    pub(crate) fn spawn(store: Arc<TokenStore>, interval: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(REFILL_THREAD_NAME.to_string())
            .spawn(move || run(&store, interval, &stop_rx))?;

        Ok(Self { handle, stop_tx })
    }

    /// Signals the thread and waits for it to exit.
    pub(crate) fn stop(self) {
        // The thread may already be gone if it panicked; nothing to signal then.
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            warn!("Refill thread panicked before it was stopped");
        }
    }
}

fn run(store: &TokenStore, interval: Duration, stop_rx: &mpsc::Receiver<()>) {
    info!(
        "Started refill thread (interval: {:?}, capacity: {})",
        interval,
        store.capacity()
    );

    let mut next_tick = Instant::now().checked_add(interval);

    loop {
        let signal = match next_tick {
            Some(at) => stop_rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            // Interval too long to schedule: nothing to do but wait for stop.
            None => stop_rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };

        match signal {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                info!("Refill thread stopping");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                match store.deposit() {
                    Deposit::Stored => trace!("Deposited refill token"),
                    Deposit::HandedOff => trace!("Handed refill token to a waiting caller"),
                    Deposit::Dropped => trace!("Store full, dropped refill token"),
                }
                next_tick = schedule_next(next_tick, interval);
            }
        }
    }
}

/// Advances the schedule by one interval. Ticks that are already in the
/// past are skipped rather than delivered in a burst.
fn schedule_next(current: Option<Instant>, interval: Duration) -> Option<Instant> {
    let next = current?.checked_add(interval)?;
    let now = Instant::now();

    if next > now {
        return Some(next);
    }

    let behind = now - next;
    let skipped = behind.as_nanos() / interval.as_nanos().max(1) + 1;
    debug!("Refill thread behind schedule by {:?}, skipping {} tick(s)", behind, skipped);
    now.checked_add(interval)
}
