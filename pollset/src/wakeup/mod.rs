//! Cross-thread wakeups.
//!
//! A wakeup is a synthetic readiness source. Put its
//! [`descriptor`](Signal::descriptor) in a poll set; any thread may then
//! [`signal`](Signal::signal) it, and every multiplexing call that includes
//! it, already blocked or issued later, reports it `READABLE` until the
//! owner calls [`acknowledge`](Signal::acknowledge). Several signals before
//! one acknowledge coalesce into a single readiness indication.
//!
//! The mechanism differs per backend:
//!
//! - [`FdWakeup`]: `eventfd` or self-pipe, for `poll(2)`, `select(2)` and
//!   fan-out on unix.
//! - [`UserEventWakeup`]: a kqueue `EVFILT_USER` registration.
//! - [`EventWakeup`]: a Windows manual-reset event object.
//! - [`TokenWakeup`]: an atomic flag plus a registered wait token, for the
//!   wait-queue backend.
//!
//! [`Wakeup`] names the variant matching the build's default
//! [`Multiplexer`](crate::Multiplexer).
//!
//! A wakeup must not be dropped while a multiplexing call that includes it
//! is in progress; the borrow in [`PollFd`] enforces this.

mod token;

#[cfg(unix)]
mod fd;

#[cfg(windows)]
mod event;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
mod user_event;

pub use token::TokenWakeup;

#[cfg(unix)]
pub use fd::FdWakeup;

#[cfg(windows)]
pub use event::EventWakeup;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub use user_event::UserEventWakeup;

use crate::fd::PollFd;

/// The wakeup contract shared by every variant.
pub trait Signal: Send + Sync {
    /// Marks the wakeup pending. Idempotent, never blocks or allocates.
    fn signal(&self);

    /// Clears the pending state. Only the thread polling the wakeup may
    /// call this. A no-op if nothing is pending.
    fn acknowledge(&self);

    /// The poll set entry for this wakeup. Always the same value.
    fn descriptor(&self) -> PollFd<'_>;
}

cfg_if::cfg_if! {
    if #[cfg(any(feature = "bare-metal", not(any(unix, windows))))] {
        /// Wakeup variant of the default multiplexer.
        pub type Wakeup = TokenWakeup;
    } else if #[cfg(windows)] {
        /// Wakeup variant of the default multiplexer.
        pub type Wakeup = EventWakeup;
    } else if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
        /// Wakeup variant of the default multiplexer.
        pub type Wakeup = UserEventWakeup;
    } else {
        /// Wakeup variant of the default multiplexer.
        pub type Wakeup = FdWakeup;
    }
}
