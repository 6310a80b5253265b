//! Cooperative cancellation and wake-up primitives
//!
//! A single consumer thread blocks in [`WakeSignal::wait_timeout`] while it
//! waits for new part files. Two independent sources can end that wait early:
//! the directory watcher (a hint that a file was created) and
//! [`CancellationToken::cancel`]. Neither of them touches reader state; they
//! only flip the latch and wake the waiter.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a [`WakeSignal::wait_timeout`] call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    Notified,
    TimedOut,
}

/// One-shot latch with a condition variable
///
/// A notification delivered while nobody is waiting is kept until the next
/// wait consumes it.
#[derive(Debug, Default)]
pub struct WakeSignal {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch and wake the waiter, if any
    pub fn notify(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.cond.notify_all();
    }

    /// Block until notified or until `timeout` elapses, clearing the latch
    pub fn wait_timeout(&self, timeout: Duration) -> WakeReason {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while !*pending {
            if self.cond.wait_until(&mut pending, deadline).timed_out() {
                break;
            }
        }
        if *pending {
            *pending = false;
            WakeReason::Notified
        } else {
            WakeReason::TimedOut
        }
    }

    /// Drop a pending notification without waiting
    pub fn clear(&self) {
        *self.pending.lock() = false;
    }
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    waiters: Mutex<Vec<Arc<WakeSignal>>>,
}

/// Cloneable cancellation handle shared between the caller and the reader
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every registered waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let waiters = self.inner.waiters.lock();
        for signal in waiters.iter() {
            signal.notify();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register `signal` to be notified on cancellation for the guard's lifetime
    ///
    /// If the token is already cancelled the signal is notified right away, so
    /// a wait started after registration returns immediately.
    pub fn register(&self, signal: &Arc<WakeSignal>) -> Registration<'_> {
        self.inner.waiters.lock().push(Arc::clone(signal));
        if self.is_cancelled() {
            signal.notify();
        }
        Registration {
            token: self,
            signal: Arc::clone(signal),
        }
    }

    /// Sleep for `timeout` or until cancelled, whichever comes first
    ///
    /// Returns `true` if the token was cancelled.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let signal = Arc::new(WakeSignal::new());
        let _registration = self.register(&signal);
        signal.wait_timeout(timeout);
        self.is_cancelled()
    }
}

/// Removes a signal from the token's waiter list on drop
pub struct Registration<'a> {
    token: &'a CancellationToken,
    signal: Arc<WakeSignal>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .waiters
            .lock()
            .retain(|s| !Arc::ptr_eq(s, &self.signal));
    }
}
