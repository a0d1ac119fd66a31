//! Process-wide startup and teardown.
//!
//! Nothing here runs implicitly: the hosting process calls [`init`] during
//! startup and [`deinit`] during shutdown, so initialisation order stays
//! under its control and every piece can be exercised in isolation.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

/// Environment variable enabling verbose tracing of wait parameters.
pub const POLL_DEBUG_ENV: &str = "POLLSET_POLL_DEBUG";

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static POLL_DEBUG: AtomicBool = AtomicBool::new(false);

/// Initialises process-wide state.
///
/// Captures [`POLL_DEBUG_ENV`]: any non-empty value turns on debug tracing
/// for multiplexers built afterwards. Calling `init` again before
/// [`deinit`] does nothing.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return;
    }

    let debug = env::var_os(POLL_DEBUG_ENV).is_some_and(|v| !v.is_empty());
    POLL_DEBUG.store(debug, Ordering::Release);

    log::debug!("pollset initialised (poll debug: {debug})");
}

/// Tears down process-wide state so [`init`] can run again.
pub fn deinit() {
    if !INITIALIZED.swap(false, Ordering::AcqRel) {
        return;
    }

    POLL_DEBUG.store(false, Ordering::Release);

    log::debug!("pollset shut down");
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Debug tracing flag captured by the last [`init`].
pub fn poll_debug() -> bool {
    POLL_DEBUG.load(Ordering::Acquire)
}
