//! Wait-queue backend for targets without any multiplexing syscall.
//!
//! The platform integration supplies a park/wake primitive through
//! [`WaitHooks`]. A call registers a fresh [`TokenId`] on every
//! [`TokenWakeup`] in the poll set, checks the flags, and parks on the token
//! until a signal or the deadline. Raw descriptors never become ready here:
//! such targets have none.

use super::Multiplex;
use super::common::timeout_duration;

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready};
use crate::wakeup::TokenWakeup;

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Identifies one in-flight multiplexing call.
///
/// Opaque to the hooks: compare it, hash it, never interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(NonZeroUsize);

static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);

impl TokenId {
    fn next() -> Self {
        loop {
            // Zero is reserved for "no token" and is skipped on wrap-around.
            if let Some(id) = NonZeroUsize::new(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)) {
                return TokenId(id);
            }
        }
    }

    pub(crate) fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(TokenId)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Park/wake primitive supplied by the platform.
pub trait WaitHooks: Send + Sync {
    /// Parks the calling thread until `timeout` elapses (`None`: forever) or
    /// [`wake`](Self::wake) is called with `token.id()`.
    ///
    /// A wake may land between registration and this call, so
    /// implementations must check [`WaitToken::is_set`] before parking.
    /// Returning early is allowed; the caller re-checks. A finite wait calls
    /// `sleep` again with the remaining time until its deadline passes, so
    /// hooks that return at once turn it into a busy loop for the whole
    /// timeout. An infinite wait returns `Ok(0)` after one early return.
    fn sleep(&self, token: &WaitToken<'_>, timeout: Option<Duration>);

    /// Unparks every thread sleeping on `token`. May be called from
    /// interrupt context, and for tokens whose wait already returned.
    fn wake(&self, token: TokenId);
}

/// Default hooks for builds that never configured real ones.
///
/// Any use panics: parking with no way to be woken would spin forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingHooks;

impl WaitHooks for MissingHooks {
    fn sleep(&self, _token: &WaitToken<'_>, _timeout: Option<Duration>) {
        panic!("wait hooks missing: supply a WaitHooks implementation for this target");
    }

    fn wake(&self, _token: TokenId) {
        panic!("wait hooks missing: supply a WaitHooks implementation for this target");
    }
}

/// The token handed to [`WaitHooks::sleep`].
///
/// Borrows the poll set for the duration of the sleep only, so the hooks
/// can ask whether a wakeup already fired.
pub struct WaitToken<'a> {
    id: TokenId,
    fds: &'a [PollFd<'a>],
}

impl WaitToken<'_> {
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// `true` if any wakeup in the poll set is pending.
    pub fn is_set(&self) -> bool {
        self.fds
            .iter()
            .filter_map(|fd| fd.source().token_wakeup())
            .any(TokenWakeup::is_pending)
    }
}

impl fmt::Debug for WaitToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitToken")
            .field("id", &self.id)
            .field("fds", &self.fds.len())
            .finish()
    }
}

/// Wait-queue multiplexer.
pub struct WaitQueue {
    hooks: Arc<dyn WaitHooks>,
    config: Config,
}

impl WaitQueue {
    pub fn new(hooks: Arc<dyn WaitHooks>, config: Config) -> Self {
        Self { hooks, config }
    }

    pub fn hooks(&self) -> &Arc<dyn WaitHooks> {
        &self.hooks
    }

    /// Creates a wakeup sharing this multiplexer's hooks.
    pub fn wakeup(&self) -> TokenWakeup {
        TokenWakeup::new(self.hooks.clone())
    }
}

impl Multiplex for WaitQueue {
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        let deadline = timeout_duration(timeout_ms).map(|t| Instant::now() + t);
        let id = TokenId::next();

        let _registration = Registration::register(fds, id, &self.hooks)?;

        let mut slept = false;

        loop {
            let mut ready = 0;

            for fd in fds.iter_mut() {
                fd.clear_revents();

                if let Some(wakeup) = fd.source().token_wakeup() {
                    if wakeup.is_pending() {
                        fd.set_revents(Ready::READABLE);
                        ready += 1;
                    }
                }
            }

            if ready > 0 || timeout_ms == 0 {
                return Ok(ready);
            }

            // A finite wait sleeps again after a spurious return until its
            // deadline passes. An infinite one returns after a single sleep.
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(0);
                    }
                    Some(deadline - now)
                }
                None if slept => return Ok(0),
                None => None,
            };

            if self.config.debug {
                log::debug!("wait queue: token {} sleeping for {remaining:?}", id.get());
            }

            self.hooks.sleep(&WaitToken { id, fds: &*fds }, remaining);
            slept = true;
        }
    }
}

impl fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitQueue")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Token registration on every wakeup of one call, undone on drop.
struct Registration<'w> {
    id: TokenId,
    wakeups: Vec<&'w TokenWakeup>,
}

impl<'w> Registration<'w> {
    fn register(fds: &[PollFd<'w>], id: TokenId, hooks: &Arc<dyn WaitHooks>) -> Result<Self> {
        let mut registration = Registration {
            id,
            wakeups: Vec::new(),
        };

        for fd in fds {
            let source = fd.source();

            let Some(wakeup) = source.token_wakeup() else {
                if source.raw().is_none() {
                    return Err(Error::InvalidArgument(
                        "the wait queue only waits on token wakeups",
                    ));
                }
                continue;
            };

            // Its signal would wake through hooks this call never parks on.
            if !wakeup.shares_hooks(hooks) {
                return Err(Error::InvalidArgument(
                    "wakeup was created with different wait hooks",
                ));
            }

            if !wakeup.register(id) {
                return Err(Error::InvalidArgument(
                    "wakeup is already registered by another wait",
                ));
            }
            registration.wakeups.push(wakeup);
        }

        Ok(registration)
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        for wakeup in &self.wakeups {
            wakeup.unregister(self.id);
        }
    }
}
