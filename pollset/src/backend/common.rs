use crate::fd::PollFd;

use std::time::Duration;

/// Timeout value meaning "block until something is ready".
pub const INFINITE: i32 = -1;

/// Converts a millisecond timeout; any negative value waits forever.
pub(crate) fn timeout_duration(timeout_ms: i32) -> Option<Duration> {
    u64::try_from(timeout_ms).ok().map(Duration::from_millis)
}

pub(crate) fn clear_all(fds: &mut [PollFd<'_>]) {
    for fd in fds {
        fd.clear_revents();
    }
}

pub(crate) fn count_ready(fds: &[PollFd<'_>]) -> usize {
    fds.iter().filter(|fd| fd.is_ready()).count()
}
