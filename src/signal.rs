//! Unix signal handling (SIGINT).
//!
//! The first SIGINT flips the cancellation token, which stops the walker
//! from dispatching new targets and kills the active subprocesses.
//! SA_RESETHAND clears the handler, so a second ^C kills walk itself.

use crate::cancel::Cancel;
use std::sync::OnceLock;

static SIGINT_CANCEL: OnceLock<Cancel> = OnceLock::new();

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    if let Some(cancel) = SIGINT_CANCEL.get() {
        cancel.cancel();
    }
}

#[cfg(unix)]
pub fn register_sigint(cancel: &Cancel) {
    let _ = SIGINT_CANCEL.set(cancel.clone());
    // Safety: registering a signal handler is libc unsafe code.
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigint_handler as libc::sighandler_t;
        sa.sa_flags = libc::SA_RESETHAND;
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

#[cfg(not(unix))]
pub fn register_sigint(cancel: &Cancel) {
    let _ = SIGINT_CANCEL.set(cancel.clone());
}
