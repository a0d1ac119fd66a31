//! Descriptor interest records.
//!
//! A poll set is a caller-owned `&mut [PollFd]`. Each entry names a
//! [`Source`] to wait on, the conditions requested in `events`, and receives
//! the observed conditions in `revents` when a multiplexing call returns.

use bitflags::bitflags;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
use crate::wakeup::UserEventWakeup;
use crate::wakeup::TokenWakeup;

/// Raw platform descriptor.
///
/// On unix this is a file descriptor. On Windows it is a `HANDLE` stored as
/// an integer so poll sets stay `Send`.
#[cfg(unix)]
pub type RawHandle = std::os::fd::RawFd;

/// Raw platform descriptor.
///
/// On unix this is a file descriptor. On Windows it is a `HANDLE` stored as
/// an integer so poll sets stay `Send`.
#[cfg(windows)]
pub type RawHandle = isize;

#[cfg(not(any(unix, windows)))]
pub type RawHandle = isize;

bitflags! {
    /// Readiness conditions.
    ///
    /// `READABLE`, `WRITABLE` and `PRIORITY` may be requested. `HANGUP` and
    /// `ERROR` are only ever reported, whether requested or not.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Ready: u16 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const PRIORITY = 1 << 2;
        const HANGUP   = 1 << 3;
        const ERROR    = 1 << 4;
    }
}

impl Ready {
    /// Conditions a caller may request.
    pub const INTEREST: Ready = Ready::READABLE
        .union(Ready::WRITABLE)
        .union(Ready::PRIORITY);
}

/// What a [`PollFd`] waits on.
///
/// `Raw` is a real descriptor. The other variants are sentinels recognised
/// by the backend that understands them; any other backend rejects them
/// with [`Error::InvalidArgument`](crate::Error::InvalidArgument).
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// A file descriptor (unix) or waitable handle (Windows).
    Raw(RawHandle),

    /// A kqueue user event.
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    UserEvent(&'a UserEventWakeup),

    /// An atomic flag wakeup for the wait-queue backend.
    Token(&'a TokenWakeup),

    /// The calling thread's window message queue.
    #[cfg(windows)]
    Messages,
}

impl<'a> Source<'a> {
    /// Returns the raw descriptor, if this is one.
    pub fn raw(&self) -> Option<RawHandle> {
        match *self {
            Source::Raw(handle) => Some(handle),
            _ => None,
        }
    }

    /// Returns the wait-queue wakeup, if this is one.
    pub fn token_wakeup(&self) -> Option<&'a TokenWakeup> {
        match *self {
            Source::Token(wakeup) => Some(wakeup),
            _ => None,
        }
    }

    /// Returns the kqueue user event, if this is one.
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    pub fn user_event(&self) -> Option<&'a UserEventWakeup> {
        match *self {
            Source::UserEvent(wakeup) => Some(wakeup),
            _ => None,
        }
    }

    /// `true` for sources that may only be waited on from the thread that
    /// owns them (the Windows message queue).
    pub fn is_thread_affine(&self) -> bool {
        #[cfg(windows)]
        if let Source::Messages = self {
            return true;
        }

        false
    }
}

/// One entry of a poll set.
///
/// `revents` is written by the multiplexer; callers read it back with
/// [`revents`](Self::revents) after the call returns.
#[derive(Debug, Clone, Copy)]
pub struct PollFd<'a> {
    source: Source<'a>,
    events: Ready,
    revents: Ready,
    tag: usize,
}

impl<'a> PollFd<'a> {
    /// Creates an entry waiting on a raw descriptor.
    ///
    /// Only the [`Ready::INTEREST`] bits of `events` are kept.
    pub fn new(handle: RawHandle, events: Ready) -> Self {
        Self::from_source(Source::Raw(handle), events)
    }

    /// Creates an entry waiting on any [`Source`].
    pub fn from_source(source: Source<'a>, events: Ready) -> Self {
        Self {
            source,
            events: events & Ready::INTEREST,
            revents: Ready::empty(),
            tag: 0,
        }
    }

    /// Creates an entry for the calling thread's message queue.
    #[cfg(windows)]
    pub fn messages() -> Self {
        Self::from_source(Source::Messages, Ready::READABLE)
    }

    /// Attaches a caller-owned tag. The multiplexer never reads it.
    pub fn with_tag(mut self, tag: usize) -> Self {
        self.tag = tag;
        self
    }

    pub fn source(&self) -> Source<'a> {
        self.source
    }

    pub fn events(&self) -> Ready {
        self.events
    }

    /// Replaces the requested conditions.
    pub fn set_events(&mut self, events: Ready) {
        self.events = events & Ready::INTEREST;
    }

    /// Conditions observed by the last multiplexing call.
    pub fn revents(&self) -> Ready {
        self.revents
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    /// `true` if the last call reported anything for this entry.
    pub fn is_ready(&self) -> bool {
        !self.revents.is_empty()
    }

    pub(crate) fn clear_revents(&mut self) {
        self.revents = Ready::empty();
    }

    pub(crate) fn set_revents(&mut self, revents: Ready) {
        self.revents = revents;
    }

    #[cfg(any(
        windows,
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd"
    ))]
    pub(crate) fn insert_revents(&mut self, revents: Ready) {
        self.revents |= revents;
    }
}
