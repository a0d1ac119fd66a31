//! Platform multiplexing backends.
//!
//! Every backend implements [`Multiplex`]. The one used by
//! [`Builder::build`](crate::Builder::build) is selected at compile time
//! and exported as [`Multiplexer`]:
//!
//! - `bare-metal` feature, or a target that is neither unix nor Windows:
//!   [`WaitQueue`]
//! - Windows: [`FanOut`] over [`HandleWait`]
//! - macOS, iOS, FreeBSD: [`Kqueue`]
//! - other unix with the `select` feature: [`Select`]
//! - other unix: [`Poll`]

mod common;
mod fanout;
mod wait_queue;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
mod poll;

#[cfg(unix)]
mod select;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
mod kqueue;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
mod handle_wait;

pub use common::INFINITE;
pub use fanout::{BoundedWait, FanOut};
pub use wait_queue::{MissingHooks, TokenId, WaitHooks, WaitQueue, WaitToken};

#[cfg(unix)]
pub use poll::Poll;

#[cfg(unix)]
pub use select::Select;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub use kqueue::Kqueue;

#[cfg(windows)]
pub use handle_wait::HandleWait;

use crate::error::Result;
use crate::fd::PollFd;

/// Waits until at least one entry of a poll set is ready.
pub trait Multiplex {
    /// Blocks until an entry is ready or `timeout_ms` elapses.
    ///
    /// A negative timeout waits forever and `0` only checks. On return
    /// each entry's `revents` holds its observed conditions, and the result
    /// is the number of entries with non-empty `revents` (`0` on timeout).
    ///
    /// A call interrupted by a signal returns
    /// [`Error::Interrupted`](crate::Error::Interrupted).
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize>;
}

cfg_if::cfg_if! {
    if #[cfg(any(feature = "bare-metal", not(any(unix, windows))))] {
        /// Multiplexer selected for this target.
        pub type Multiplexer = WaitQueue;
    } else if #[cfg(windows)] {
        /// Multiplexer selected for this target.
        pub type Multiplexer = FanOut<HandleWait>;
    } else if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
        /// Multiplexer selected for this target.
        pub type Multiplexer = Kqueue;
    } else if #[cfg(feature = "select")] {
        /// Multiplexer selected for this target.
        pub type Multiplexer = Select;
    } else {
        /// Multiplexer selected for this target.
        pub type Multiplexer = Poll;
    }
}
