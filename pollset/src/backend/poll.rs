//! Native `poll(2)` backend.
//!
//! A thin pass-through: the kernel recomputes `revents` for every entry, so
//! nothing is cleared beforehand. On failure the entries keep whatever they
//! held before the call.

use super::Multiplex;
use super::fanout::BoundedWait;

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready};
use crate::wakeup::FdWakeup;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, POLLPRI, c_short, nfds_t, pollfd};

/// `poll(2)` multiplexer.
#[derive(Debug, Clone, Default)]
pub struct Poll {
    config: Config,
}

impl Poll {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn wait(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        let mut pollfds = Vec::with_capacity(fds.len());

        for fd in fds.iter() {
            let raw = fd
                .source()
                .raw()
                .ok_or(Error::InvalidArgument("poll(2) only waits on raw descriptors"))?;

            pollfds.push(pollfd {
                fd: raw,
                events: to_poll_events(fd.events()),
                revents: 0,
            });
        }

        if self.config.debug {
            log::debug!("poll: waiting for {} fds, timeout {timeout_ms}", pollfds.len());
        }

        let n = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as nfds_t, timeout_ms) };

        if n < 0 {
            let err = Error::last_os_error();
            if !err.is_interrupted() {
                log::warn!("poll(2) failed: {err}");
            }
            return Err(err);
        }

        for (fd, pfd) in fds.iter_mut().zip(&pollfds) {
            fd.set_revents(from_poll_events(pfd.revents));
        }

        if self.config.debug {
            log::debug!("poll: {n} ready");
        }

        Ok(n as usize)
    }
}

impl Multiplex for Poll {
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        self.wait(fds, timeout_ms)
    }
}

/// `poll(2)` has no real object limit; the configured ceiling is honoured
/// anyway so [`FanOut`](super::FanOut) can be driven by this backend.
impl BoundedWait for Poll {
    type Signal = FdWakeup;

    fn config(&self) -> &Config {
        &self.config
    }

    fn new_signal(&self) -> Result<FdWakeup> {
        FdWakeup::new()
    }

    fn wait_group(&self, group: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        self.wait(group, timeout_ms)
    }
}

fn to_poll_events(events: Ready) -> c_short {
    let mut flags = 0;

    if events.contains(Ready::READABLE) {
        flags |= POLLIN;
    }
    if events.contains(Ready::WRITABLE) {
        flags |= POLLOUT;
    }
    if events.contains(Ready::PRIORITY) {
        flags |= POLLPRI;
    }

    flags
}

fn from_poll_events(revents: c_short) -> Ready {
    let mut ready = Ready::empty();

    if revents & POLLIN != 0 {
        ready |= Ready::READABLE;
    }
    if revents & POLLOUT != 0 {
        ready |= Ready::WRITABLE;
    }
    if revents & POLLPRI != 0 {
        ready |= Ready::PRIORITY;
    }
    if revents & POLLHUP != 0 {
        ready |= Ready::HANGUP;
    }
    if revents & (POLLERR | POLLNVAL) != 0 {
        ready |= Ready::ERROR;
    }

    ready
}
