//! # pollset
//!
//! **pollset** is the readiness layer underneath an event loop: it blocks the
//! calling thread until at least one descriptor of a caller-owned poll set is
//! ready or a timeout elapses, and it lets any other thread cut such a wait
//! short through a wakeup.
//!
//! The same contract is served by whichever native facility the target has:
//!
//! - `poll(2)` on unix, or a `select(2)` emulation with the `select` feature
//! - a per-call kqueue on macOS, iOS and FreeBSD
//! - handle waits on Windows, fanned out over worker threads past the
//!   64-object limit
//! - a park/wake wait queue on targets without any of these (`bare-metal`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pollset::{Builder, Multiplex, PollFd, Ready, Signal, Wakeup};
//!
//! pollset::init();
//!
//! let wakeup = Wakeup::new()?;
//! let mut fds = [
//!     PollFd::new(socket_fd, Ready::READABLE).with_tag(1),
//!     wakeup.descriptor(),
//! ];
//!
//! let multiplexer = Builder::new().build();
//! let ready = multiplexer.multiplex(&mut fds, 1_000)?;
//!
//! if fds[1].is_ready() {
//!     wakeup.acknowledge();
//! }
//! ```
//!
//! With `bare-metal`, `Wakeup` is a [`TokenWakeup`](wakeup::TokenWakeup)
//! bound to its queue's hooks, so it comes from the queue instead:
//!
//! ```rust,ignore
//! let queue = Builder::new().wait_hooks(hooks).build_wait_queue();
//! let wakeup = queue.wakeup();
//!
//! let mut fds = [wakeup.descriptor()];
//! let ready = queue.multiplex(&mut fds, 1_000)?;
//! ```
//!
//! ## Modules
//!
//! - [`backend`]: the multiplexers and the fan-out and wait-queue machinery
//! - [`wakeup`]: cross-thread wakeups

mod builder;
mod error;
mod fd;
mod lifecycle;

pub mod backend;
pub mod wakeup;

pub use backend::{INFINITE, Multiplex, Multiplexer};
pub use builder::{Builder, Config, MAXIMUM_WAIT_OBJECTS};
pub use error::{Error, ErrorKind, Result};
pub use fd::{PollFd, RawHandle, Ready, Source};
pub use lifecycle::{POLL_DEBUG_ENV, deinit, init, is_initialized, poll_debug};
pub use wakeup::{Signal, Wakeup};

/// Waits on `fds` with the default multiplexer for this target.
///
/// Shorthand for `Builder::new().build().multiplex(fds, timeout_ms)`.
/// Bare-metal builds need hooks and must go through
/// [`Builder::wait_hooks`] instead.
pub fn multiplex(fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
    Builder::new().build().multiplex(fds, timeout_ms)
}
