//! kqueue `EVFILT_USER` wakeup.
//!
//! The multiplexer creates a fresh kqueue per call, so the wakeup only has a
//! kqueue to trigger while a call that includes it is in flight. Signals
//! outside that window are counted and replayed when the next call
//! realizes the wakeup.

use super::Signal;

use crate::backend::unix::{kevent_change, sys_kevent};
use crate::error::Result;
use crate::fd::{PollFd, Ready, Source};

use libc::{EV_ADD, EV_DELETE, EVFILT_USER, NOTE_FFCOPY, NOTE_TRIGGER};
use std::os::fd::RawFd;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_IDENT: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug)]
struct State {
    /// Kqueue of the call currently waiting on this wakeup, `-1` if none.
    kq: RawFd,
    pending: u32,
}

/// Wakeup delivered as a kqueue user event.
#[derive(Debug)]
pub struct UserEventWakeup {
    ident: usize,
    state: Mutex<State>,
}

impl UserEventWakeup {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ident: NEXT_IDENT.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(State { kq: -1, pending: 0 }),
        })
    }

    /// The `EVFILT_USER` identifier registered for this wakeup.
    pub fn ident(&self) -> usize {
        self.ident
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().pending != 0
    }

    pub fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        self.signal_locked(&mut state);
    }

    pub fn acknowledge(&self) {
        let mut state = self.state.lock().unwrap();

        // Re-adding resets the triggered filter.
        if state.kq != -1 {
            let changes = [
                kevent_change(self.ident, EVFILT_USER, EV_DELETE, 0, 0),
                kevent_change(self.ident, EVFILT_USER, EV_ADD, NOTE_FFCOPY, 0),
            ];
            let _ = sys_kevent(state.kq, &changes, &mut [], None);
        }

        state.pending = 0;
    }

    pub fn descriptor(&self) -> PollFd<'_> {
        PollFd::from_source(Source::UserEvent(self), Ready::READABLE)
    }

    /// Binds the wakeup to `kq` for the duration of one call. A signal
    /// that arrived earlier triggers immediately.
    pub(crate) fn realize(&self, kq: RawFd) {
        let mut state = self.state.lock().unwrap();

        state.kq = kq;

        if state.pending != 0 {
            self.signal_locked(&mut state);
        }
    }

    pub(crate) fn unrealize(&self) {
        self.state.lock().unwrap().kq = -1;
    }

    fn signal_locked(&self, state: &mut State) {
        if state.kq != -1 {
            let change = kevent_change(self.ident, EVFILT_USER, 0, NOTE_TRIGGER, 0);
            let _ = sys_kevent(state.kq, &[change], &mut [], None);
        }

        state.pending = state.pending.saturating_add(1);
    }
}

impl Signal for UserEventWakeup {
    fn signal(&self) {
        UserEventWakeup::signal(self)
    }

    fn acknowledge(&self) {
        UserEventWakeup::acknowledge(self)
    }

    fn descriptor(&self) -> PollFd<'_> {
        UserEventWakeup::descriptor(self)
    }
}
