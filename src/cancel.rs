//! Cancellation token threaded through every operation that may block.
//!
//! Cancellation never raises; blocked operations observe the token and
//! return promptly, and running subprocesses are killed by their owners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Cancel {
    fired: Arc<AtomicBool>,
}

impl Cancel {
    pub fn new() -> Cancel {
        Cancel::default()
    }

    pub fn cancel(&self) {
        self.fired.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Relaxed)
    }
}
