//! Waitable-handle backend for Windows.
//!
//! Raw entries are waitable handles; a [`Source::Messages`] entry asks for
//! the calling thread's message queue. One native wait reports at most one
//! signalled object, so when several objects are polled a zero-timeout pass
//! walks them first and the real timeout is only spent if nothing was ready.
//! Poll sets beyond the native ceiling go through [`FanOut`](super::FanOut).

use super::common::clear_all;
use super::fanout::BoundedWait;
use super::windows::{
    INFINITE, WAIT_FAILED, WAIT_IO_COMPLETION, WAIT_OBJECT_0, WAIT_TIMEOUT, as_handle, sys_sleep,
    sys_wait_any, sys_wait_any_or_messages,
};

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready, Source};
use crate::wakeup::EventWakeup;

use windows_sys::Win32::Foundation::HANDLE;

/// Handle-wait multiplexer for at most [`Config::ceiling`] objects.
#[derive(Debug, Clone, Default)]
pub struct HandleWait {
    config: Config,
}

/// The objects of one group, in poll set order.
struct Objects {
    handles: Vec<HANDLE>,

    /// Poll set index of each handle.
    owners: Vec<usize>,

    /// Poll set index of the message queue entry.
    messages: Option<usize>,
}

impl HandleWait {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn collect(&self, group: &mut [PollFd<'_>]) -> Result<Objects> {
        let mut objects = Objects {
            handles: Vec::with_capacity(group.len()),
            owners: Vec::with_capacity(group.len()),
            messages: None,
        };
        let mut seen_messages = false;

        clear_all(group);

        for (index, fd) in group.iter().enumerate() {
            match fd.source() {
                Source::Messages => {
                    if seen_messages {
                        return Err(Error::InvalidArgument(
                            "at most one message queue entry per call",
                        ));
                    }
                    seen_messages = true;

                    if fd.events().contains(Ready::READABLE) {
                        objects.messages = Some(index);
                    }
                }
                Source::Raw(raw) if raw > 0 && !fd.events().is_empty() => {
                    objects.handles.push(as_handle(raw));
                    objects.owners.push(index);
                }
                Source::Raw(_) => {}
                _ => {
                    return Err(Error::InvalidArgument(
                        "handle wait only accepts handles and the message queue",
                    ));
                }
            }
        }

        let count = objects.handles.len() + usize::from(objects.messages.is_some());
        if count > self.config.ceiling {
            return Err(Error::TooManyDescriptors {
                count,
                limit: self.config.ceiling,
            });
        }

        Ok(objects)
    }

    /// One native wait over `handles` (and the message queue if
    /// `messages` is set), recursing over the remaining handles when a
    /// zero-timeout wait finds one ready.
    fn wait_rest(
        &self,
        group: &mut [PollFd<'_>],
        messages: Option<usize>,
        handles: &[HANDLE],
        owners: &[usize],
        timeout: u32,
    ) -> Result<usize> {
        let count = handles.len() as u32;

        let ready = if messages.is_some() {
            sys_wait_any_or_messages(handles, timeout)
        } else if handles.is_empty() {
            if timeout == INFINITE {
                return Err(Error::InvalidArgument(
                    "nothing to wait for with an infinite timeout",
                ));
            }
            sys_sleep(timeout);
            WAIT_TIMEOUT
        } else {
            sys_wait_any(handles, timeout)
        };

        if self.config.debug {
            log::debug!("handle wait: {count} handles, timeout {timeout}, returned {ready:#x}");
        }

        if ready == WAIT_FAILED {
            let err = Error::last_os_error();
            log::warn!("handle wait failed: {err}");
            return Err(err);
        }

        if ready == WAIT_TIMEOUT || ready == WAIT_IO_COMPLETION {
            return Ok(0);
        }

        if let Some(index) = messages {
            if ready == WAIT_OBJECT_0 + count {
                group[index].insert_revents(Ready::READABLE);

                // With a real timeout, noticing the messages is enough.
                if timeout != 0 || handles.is_empty() {
                    return Ok(1);
                }

                return Ok(1 + self.wait_rest(group, None, handles, owners, 0)?);
            }
        }

        if ready < WAIT_OBJECT_0 + count {
            let signalled = (ready - WAIT_OBJECT_0) as usize;
            let fd = &mut group[owners[signalled]];
            fd.set_revents(fd.events());

            if timeout == 0 && handles.len() > 1 {
                let next = signalled + 1;
                return Ok(
                    1 + self.wait_rest(group, None, &handles[next..], &owners[next..], 0)?
                );
            }

            return Ok(1);
        }

        // Abandoned mutexes and anything else unexpected.
        Ok(0)
    }
}

impl BoundedWait for HandleWait {
    type Signal = EventWakeup;

    fn config(&self) -> &Config {
        &self.config
    }

    fn new_signal(&self) -> Result<EventWakeup> {
        EventWakeup::new()
    }

    fn wait_group(&self, group: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        let Objects {
            handles,
            owners,
            messages,
        } = self.collect(group)?;

        let timeout = u32::try_from(timeout_ms).unwrap_or(INFINITE);

        let several = handles.len() > 1 || (!handles.is_empty() && messages.is_some());

        if !several {
            return self.wait_rest(group, messages, &handles, &owners, timeout);
        }

        // Check first what is ready right now, then block.
        let ready = self.wait_rest(group, messages, &handles, &owners, 0)?;

        if ready == 0 && timeout != 0 {
            return self.wait_rest(group, messages, &handles, &owners, timeout);
        }

        Ok(ready)
    }
}
