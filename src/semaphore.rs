//! Admission control for the parallel walk.

use crate::cancel::Cancel;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Caps the number of targets executing concurrently.
///
/// A capacity of 0 means unlimited: acquire and release are no-ops.  An
/// acquire that observes cancellation returns false without taking a
/// permit so that no vertex can wedge the walker during shutdown; release
/// must only be called for an acquire that returned true.
pub struct Semaphore {
    inner: Option<Inner>,
}

struct Inner {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub fn new(capacity: usize) -> Semaphore {
        if capacity == 0 {
            return Semaphore { inner: None };
        }
        Semaphore {
            inner: Some(Inner {
                permits: Mutex::new(capacity),
                available: Condvar::new(),
            }),
        }
    }

    /// Take a permit, blocking until one is available.  Returns whether a
    /// permit was actually granted; a cancelled acquire returns false.
    #[must_use]
    pub fn acquire(&self, cancel: &Cancel) -> bool {
        let Some(inner) = &self.inner else {
            return true;
        };
        let mut permits = inner.permits.lock().unwrap();
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if *permits > 0 {
                *permits -= 1;
                return true;
            }
            // Wake periodically to observe cancellation.
            let (guard, _) = inner
                .available
                .wait_timeout(permits, Duration::from_millis(50))
                .unwrap();
            permits = guard;
        }
    }

    pub fn release(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        let mut permits = inner.permits.lock().unwrap();
        *permits += 1;
        inner.available.notify_one();
    }
}
