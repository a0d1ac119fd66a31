use super::Signal;

use crate::backend::{TokenId, WaitHooks};
use crate::fd::{PollFd, Ready, Source};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Wakeup for the wait-queue backend.
///
/// An atomic flag plus the id of the wait currently parked on it. A
/// multiplexing call registers its token on entry and clears it on exit;
/// `signal` sets the flag and, if a token is registered, hands it to
/// [`WaitHooks::wake`].
///
/// The flag is stored before the token is read, and the waiter stores its
/// token before reading the flag, so at least one side always sees the
/// other: a signal racing with registration is never lost.
pub struct TokenWakeup {
    signalled: AtomicBool,

    /// Raw [`TokenId`] of the registered wait, `0` when none.
    token: AtomicUsize,

    hooks: Arc<dyn WaitHooks>,
}

impl TokenWakeup {
    /// Creates a wakeup that unparks waits through `hooks`.
    ///
    /// A [`WaitQueue`](crate::backend::WaitQueue) only accepts wakeups built
    /// on its own hooks; [`WaitQueue::wakeup`](crate::backend::WaitQueue::wakeup)
    /// is the usual way to get one.
    pub fn new(hooks: Arc<dyn WaitHooks>) -> Self {
        Self {
            signalled: AtomicBool::new(false),
            token: AtomicUsize::new(0),
            hooks,
        }
    }

    /// Marks the wakeup pending and unparks the registered wait, if any.
    ///
    /// Lock-free; callable from interrupt context as long as the hooks'
    /// `wake` is.
    pub fn signal(&self) {
        self.signalled.store(true, Ordering::SeqCst);

        if let Some(id) = TokenId::from_raw(self.token.load(Ordering::SeqCst)) {
            self.hooks.wake(id);
        }
    }

    pub fn acknowledge(&self) {
        self.signalled.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }

    /// `true` while a multiplexing call has its token registered here.
    pub fn is_registered(&self) -> bool {
        self.token.load(Ordering::SeqCst) != 0
    }

    pub fn descriptor(&self) -> PollFd<'_> {
        PollFd::from_source(Source::Token(self), Ready::READABLE)
    }

    /// `true` if this wakeup unparks through the same hooks instance.
    pub(crate) fn shares_hooks(&self, hooks: &Arc<dyn WaitHooks>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.hooks), Arc::as_ptr(hooks))
    }

    /// Registers `id`. Fails if another wait owns the slot.
    pub(crate) fn register(&self, id: TokenId) -> bool {
        match self
            .token
            .compare_exchange(0, id.get(), Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            // Listed twice in the same poll set.
            Err(current) => current == id.get(),
        }
    }

    /// Clears the slot if it still holds `id`.
    pub(crate) fn unregister(&self, id: TokenId) {
        let _ = self
            .token
            .compare_exchange(id.get(), 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

impl Signal for TokenWakeup {
    fn signal(&self) {
        TokenWakeup::signal(self)
    }

    fn acknowledge(&self) {
        TokenWakeup::acknowledge(self)
    }

    fn descriptor(&self) -> PollFd<'_> {
        TokenWakeup::descriptor(self)
    }
}

impl fmt::Debug for TokenWakeup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenWakeup")
            .field("signalled", &self.is_pending())
            .field("token", &self.token.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
