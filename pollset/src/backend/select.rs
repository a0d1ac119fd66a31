//! `select(2)` emulation of the poll contract.
//!
//! Used where `poll(2)` is missing or broken. `select` cannot report
//! hang-ups or errors, and descriptors must stay below `FD_SETSIZE`.

use super::Multiplex;
use super::common::{clear_all, count_ready};

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready};

use libc::{FD_ISSET, FD_SET, FD_SETSIZE, FD_ZERO, fd_set, suseconds_t, time_t, timeval};
use std::mem;
use std::os::fd::RawFd;
use std::ptr;

/// `select(2)` multiplexer.
#[derive(Debug, Clone, Default)]
pub struct Select {
    config: Config,
}

impl Select {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Multiplex for Select {
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        clear_all(fds);

        let mut rset: fd_set = unsafe { mem::zeroed() };
        let mut wset: fd_set = unsafe { mem::zeroed() };
        let mut xset: fd_set = unsafe { mem::zeroed() };

        unsafe {
            FD_ZERO(&mut rset);
            FD_ZERO(&mut wset);
            FD_ZERO(&mut xset);
        }

        let mut max_fd: RawFd = -1;

        for fd in fds.iter() {
            let raw = fd
                .source()
                .raw()
                .ok_or(Error::InvalidArgument("select(2) only waits on raw descriptors"))?;
            let events = fd.events();

            // Entries without interest still get their revents cleared above,
            // but must never land in a set.
            if raw < 0 || events.is_empty() {
                continue;
            }

            if raw as usize >= FD_SETSIZE as usize {
                return Err(Error::InvalidArgument("descriptor exceeds FD_SETSIZE"));
            }

            unsafe {
                if events.contains(Ready::READABLE) {
                    FD_SET(raw, &mut rset);
                }
                if events.contains(Ready::WRITABLE) {
                    FD_SET(raw, &mut wset);
                }
                if events.contains(Ready::PRIORITY) {
                    FD_SET(raw, &mut xset);
                }
            }

            max_fd = max_fd.max(raw);
        }

        let mut tv = (timeout_ms >= 0).then(|| timeval {
            tv_sec: (timeout_ms / 1000) as time_t,
            tv_usec: ((timeout_ms % 1000) * 1000) as suseconds_t,
        });
        let tv_ptr = tv.as_mut().map_or(ptr::null_mut(), |tv| tv as *mut timeval);

        if self.config.debug {
            log::debug!(
                "select: {} entries, max fd {max_fd}, timeout {timeout_ms}",
                fds.len()
            );
        }

        let n = unsafe { libc::select(max_fd + 1, &mut rset, &mut wset, &mut xset, tv_ptr) };

        if n < 0 {
            let err = Error::last_os_error();
            if !err.is_interrupted() {
                log::warn!("select(2) failed: {err}");
            }
            return Err(err);
        }

        if n > 0 {
            for fd in fds.iter_mut() {
                let Some(raw) = fd.source().raw() else {
                    continue;
                };

                if raw < 0 || raw as usize >= FD_SETSIZE as usize {
                    continue;
                }

                let mut revents = Ready::empty();
                unsafe {
                    if FD_ISSET(raw, &rset) {
                        revents |= Ready::READABLE;
                    }
                    if FD_ISSET(raw, &wset) {
                        revents |= Ready::WRITABLE;
                    }
                    if FD_ISSET(raw, &xset) {
                        revents |= Ready::PRIORITY;
                    }
                }
                // The same fd may appear in several entries.
                fd.set_revents(revents & fd.events());
            }
        }

        // select counts set bits, not descriptors.
        let ready = count_ready(fds);

        if self.config.debug {
            log::debug!("select: {ready} ready");
        }

        Ok(ready)
    }
}
