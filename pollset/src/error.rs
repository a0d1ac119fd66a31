use std::io;

use thiserror::Error;

/// Result type returned by every multiplexing call.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a multiplexing call or of wakeup creation.
///
/// A timeout is not an error: it is `Ok(0)`.
#[derive(Debug, Error)]
pub enum Error {
    /// The native wait was interrupted by a signal before anything became
    /// ready. Retry the call.
    #[error("wait interrupted before any descriptor became ready")]
    Interrupted,

    /// The poll set contains something the active backend cannot wait on.
    #[error("invalid poll set: {0}")]
    InvalidArgument(&'static str),

    /// More descriptors than one call (including fan-out) can service.
    #[error("too many descriptors to wait for: {count} (limit {limit})")]
    TooManyDescriptors { count: usize, limit: usize },

    /// The OS refused to create a signalling or queue resource.
    #[error("failed to create wait resource: {0}")]
    CreateResource(#[source] io::Error),

    /// The native wait failed.
    #[error("native wait failed: {0}")]
    Backend(#[source] io::Error),
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Interrupted,
    InvalidArgument,
    ResourceExhausted,
    BackendFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Interrupted => ErrorKind::Interrupted,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::TooManyDescriptors { .. } | Error::CreateResource(_) => {
                ErrorKind::ResourceExhausted
            }
            Error::Backend(_) => ErrorKind::BackendFailure,
        }
    }

    /// `true` if the caller should simply retry.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }

    /// Captures `errno` (or `GetLastError`) after a failed native wait.
    pub(crate) fn last_os_error() -> Self {
        Self::from_io(io::Error::last_os_error())
    }

    pub(crate) fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            Error::Interrupted
        } else {
            Error::Backend(err)
        }
    }
}
