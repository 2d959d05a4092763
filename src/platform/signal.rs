//! SIGINT to stop-flag bridge

use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Raised once an interrupt arrives. Only the handler writes it.
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signum: c_int) {
    // async-signal-safe: a single lock-free store
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT to the stop flag and return the flag for the render loop.
pub fn install_stop_handler() -> nix::Result<&'static AtomicBool> {
    let action = SigAction::new(SigHandler::Handler(on_interrupt), SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: the handler only touches an atomic.
    unsafe { sigaction(Signal::SIGINT, &action) }?;
    debug!("SIGINT handler installed");
    Ok(&STOP_REQUESTED)
}
