//! kqueue backend.
//!
//! Every call builds a private kqueue, registers one filter per requested
//! condition and collects what fires. User-event wakeups are bound to that
//! kqueue only while the call runs.

use super::Multiplex;
use super::common::{clear_all, count_ready};
use super::unix::{kevent_change, sys_close, sys_kevent, sys_kqueue};

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready, Source};
use crate::wakeup::UserEventWakeup;

use libc::{
    EV_ADD, EV_EOF, EV_ERROR, EVFILT_READ, EVFILT_USER, EVFILT_WRITE, NOTE_FFCOPY, c_long, time_t,
    timespec,
};
use std::mem;
use std::os::fd::RawFd;

/// kqueue multiplexer.
#[derive(Debug, Clone, Default)]
pub struct Kqueue {
    config: Config,
}

impl Kqueue {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Owns the per-call kqueue and the wakeups realized on it.
struct CallQueue<'a> {
    kq: RawFd,
    realized: Vec<&'a UserEventWakeup>,
}

impl Drop for CallQueue<'_> {
    fn drop(&mut self) {
        for wakeup in &self.realized {
            wakeup.unrealize();
        }
        sys_close(self.kq);
    }
}

impl Multiplex for Kqueue {
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        clear_all(fds);

        let mut changes = Vec::with_capacity(fds.len() * 3);
        let mut wakeups = Vec::new();

        for (index, fd) in fds.iter().enumerate() {
            match fd.source() {
                Source::UserEvent(wakeup) => {
                    changes.push(kevent_change(
                        wakeup.ident(),
                        EVFILT_USER,
                        EV_ADD,
                        NOTE_FFCOPY,
                        0,
                    ));
                    wakeups.push(wakeup);
                }
                Source::Raw(raw) if raw >= 0 => {
                    let ident = raw as usize;
                    let events = fd.events();

                    if events.contains(Ready::READABLE) {
                        changes.push(kevent_change(ident, EVFILT_READ, EV_ADD, 0, index));
                    }
                    if events.contains(Ready::WRITABLE) {
                        changes.push(kevent_change(ident, EVFILT_WRITE, EV_ADD, 0, index));
                    }
                    #[cfg(any(target_os = "macos", target_os = "ios"))]
                    if events.contains(Ready::PRIORITY) {
                        changes.push(kevent_change(
                            ident,
                            libc::EVFILT_EXCEPT,
                            EV_ADD,
                            libc::NOTE_OOB,
                            index,
                        ));
                    }
                }
                Source::Raw(_) => {}
                _ => {
                    return Err(Error::InvalidArgument(
                        "kqueue only waits on raw descriptors and user events",
                    ));
                }
            }
        }

        let kq = sys_kqueue().map_err(Error::CreateResource)?;
        let mut queue = CallQueue {
            kq,
            realized: Vec::with_capacity(wakeups.len()),
        };

        let ts = (timeout_ms >= 0).then(|| timespec {
            tv_sec: (timeout_ms / 1000) as time_t,
            tv_nsec: ((timeout_ms % 1000) as c_long) * 1_000_000,
        });

        // An empty event list makes kevent return at once; keep room for one
        // so an empty set still honours the timeout.
        let capacity = (fds.len() * 3).max(1);
        let mut events: Vec<libc::kevent> = vec![unsafe { mem::zeroed() }; capacity];

        if self.config.debug {
            log::debug!(
                "kqueue: {} changes, {} wakeups, timeout {timeout_ms}",
                changes.len(),
                wakeups.len()
            );
        }

        let collected = if wakeups.is_empty() {
            sys_kevent(kq, &changes, &mut events, ts.as_ref())
        } else {
            // Wakeups must be registered before they are realized: a pending
            // one triggers its filter straight away.
            sys_kevent(kq, &changes, &mut [], None).and_then(|_| {
                for &wakeup in &wakeups {
                    wakeup.realize(kq);
                    queue.realized.push(wakeup);
                }
                sys_kevent(kq, &[], &mut events, ts.as_ref())
            })
        };

        let n = match collected {
            Ok(n) => n,
            Err(e) => {
                let err = Error::from_io(e);
                if !err.is_interrupted() {
                    log::warn!("kevent(2) failed: {err}");
                }
                return Err(err);
            }
        };

        for ev in &events[..n] {
            apply_event(fds, ev);
        }

        let ready = if n > 0 { count_ready(fds) } else { 0 };

        if self.config.debug {
            log::debug!("kqueue: {n} events, {ready} ready");
        }

        drop(queue);

        Ok(ready)
    }
}

fn apply_event(fds: &mut [PollFd<'_>], ev: &libc::kevent) {
    if ev.filter == EVFILT_USER {
        for fd in fds.iter_mut() {
            let Some(wakeup) = fd.source().user_event() else {
                continue;
            };

            if wakeup.ident() == ev.ident as usize && fd.events().contains(Ready::READABLE) {
                fd.insert_revents(Ready::READABLE);
            }
        }
        return;
    }

    let Some(fd) = fds.get_mut(ev.udata as usize) else {
        return;
    };
    let events = fd.events();
    let mut revents = Ready::empty();

    match ev.filter {
        EVFILT_READ => {
            if events.contains(Ready::READABLE) {
                revents |= Ready::READABLE;
            }
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            if events.contains(Ready::PRIORITY) && ev.flags & libc::EV_OOBAND != 0 {
                revents |= Ready::PRIORITY;
            }
            if ev.flags & EV_EOF != 0 {
                revents |= Ready::HANGUP;
                if ev.fflags != 0 {
                    revents |= Ready::ERROR;
                }
            }
            if ev.flags & EV_ERROR != 0 {
                revents |= Ready::ERROR;
            }
        }
        EVFILT_WRITE => {
            if events.contains(Ready::WRITABLE) {
                revents |= Ready::WRITABLE;
            }
            if ev.flags & (EV_EOF | EV_ERROR) != 0 {
                revents |= Ready::ERROR;
            }
        }
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        libc::EVFILT_EXCEPT => {
            if events.contains(Ready::PRIORITY) {
                revents |= Ready::PRIORITY;
            }
            if ev.flags & EV_EOF != 0 {
                revents |= Ready::HANGUP;
            }
            if ev.flags & EV_ERROR != 0 {
                revents |= Ready::ERROR;
            }
        }
        _ => {}
    }

    fd.insert_revents(revents);
}
