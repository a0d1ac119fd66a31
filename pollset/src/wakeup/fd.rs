//! Descriptor-backed wakeup: `eventfd` where available, a self-pipe
//! otherwise.

use super::Signal;

use crate::backend::unix::{sys_close, sys_pipe, sys_read, sys_write};
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready};

use std::io;
use std::os::fd::RawFd;

/// Wakeup exposed as a readable file descriptor.
///
/// On Linux and Android this is an `eventfd`: signalling adds one to its
/// counter and acknowledging drains it. Elsewhere it is a non-blocking pipe
/// whose write end receives one byte per signal.
#[derive(Debug)]
pub struct FdWakeup {
    /// `eventfd`, or the read end of the pipe.
    read: RawFd,

    /// Write end of the pipe, `None` for an `eventfd`.
    write: Option<RawFd>,
}

impl FdWakeup {
    /// Creates a wakeup, preferring `eventfd` and falling back to a pipe
    /// on any failure.
    pub fn new() -> Result<Self> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        match crate::backend::unix::sys_eventfd() {
            Ok(fd) => return Ok(Self { read: fd, write: None }),
            Err(e) => log::debug!("eventfd unavailable, falling back to a pipe: {e}"),
        }

        Self::new_pipe()
    }

    /// Creates a pipe-backed wakeup even where `eventfd` exists.
    pub fn new_pipe() -> Result<Self> {
        let (read, write) = sys_pipe().map_err(Error::CreateResource)?;

        Ok(Self {
            read,
            write: Some(write),
        })
    }

    /// `true` if backed by an `eventfd`.
    pub fn is_eventfd(&self) -> bool {
        self.write.is_none()
    }

    /// Marks the wakeup pending.
    ///
    /// Only calls `write(2)`, so it is safe from a signal handler.
    pub fn signal(&self) {
        // EAGAIN means the pipe is full or the counter saturated, so the
        // wakeup is already pending. Nothing is logged: no allocation here.
        match self.write {
            // eventfd wants a 64-bit counter increment.
            None => retry_eintr(|| sys_write(self.read, &1u64.to_ne_bytes())),
            Some(fd) => retry_eintr(|| sys_write(fd, &[1u8])),
        };
    }

    /// Clears the pending state.
    ///
    /// Reads until a short read so a signal racing with the drain is never
    /// half-consumed.
    pub fn acknowledge(&self) {
        let mut buffer = [0u8; 16];

        while sys_read(self.read, &mut buffer) == buffer.len() as isize {}
    }

    pub fn descriptor(&self) -> PollFd<'_> {
        PollFd::new(self.read, Ready::READABLE)
    }
}

impl Signal for FdWakeup {
    fn signal(&self) {
        FdWakeup::signal(self)
    }

    fn acknowledge(&self) {
        FdWakeup::acknowledge(self)
    }

    fn descriptor(&self) -> PollFd<'_> {
        FdWakeup::descriptor(self)
    }
}

impl Drop for FdWakeup {
    fn drop(&mut self) {
        sys_close(self.read);

        if let Some(fd) = self.write {
            sys_close(fd);
        }
    }
}

fn retry_eintr(mut op: impl FnMut() -> isize) -> isize {
    loop {
        let rc = op();
        if rc >= 0 || io::Error::last_os_error().kind() != io::ErrorKind::Interrupted {
            return rc;
        }
    }
}
