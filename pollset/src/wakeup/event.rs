use super::Signal;

use crate::backend::windows::{sys_close_handle, sys_create_event, sys_reset_event, sys_set_event};
use crate::error::{Error, Result};
use crate::fd::{PollFd, Ready};

/// Wakeup backed by a manual-reset Win32 event.
///
/// The event stays signalled from `signal` until `acknowledge`, so any
/// number of concurrent waits observe it.
#[derive(Debug)]
pub struct EventWakeup {
    event: isize,
}

impl EventWakeup {
    pub fn new() -> Result<Self> {
        let event = sys_create_event().map_err(Error::CreateResource)?;
        Ok(Self { event })
    }

    pub fn signal(&self) {
        // Only fails for an invalid handle, which this type never holds.
        let _ = sys_set_event(self.event);
    }

    pub fn acknowledge(&self) {
        sys_reset_event(self.event);
    }

    pub fn descriptor(&self) -> PollFd<'_> {
        PollFd::new(self.event, Ready::READABLE)
    }
}

impl Signal for EventWakeup {
    fn signal(&self) {
        EventWakeup::signal(self)
    }

    fn acknowledge(&self) {
        EventWakeup::acknowledge(self)
    }

    fn descriptor(&self) -> PollFd<'_> {
        EventWakeup::descriptor(self)
    }
}

impl Drop for EventWakeup {
    fn drop(&mut self) {
        sys_close_handle(self.event);
    }
}
