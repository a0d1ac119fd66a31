use crate::backend::{MissingHooks, Multiplexer, WaitHooks, WaitQueue};
use crate::lifecycle;

use std::fmt;
use std::sync::Arc;

/// Per-call object ceiling of handle-wait backends.
pub const MAXIMUM_WAIT_OBJECTS: usize = 64;

/// Settings shared by every backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Emit `log::debug!` traces of wait parameters and results.
    pub(crate) debug: bool,

    /// Largest number of objects a single native wait may receive.
    pub(crate) ceiling: usize,
}

impl Config {
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

impl Default for Config {
    fn default() -> Self {
        Builder::new().config()
    }
}

/// Builder for configuring and creating a multiplexer.
///
/// # Examples
///
/// ```rust,ignore
/// let multiplexer = Builder::new()
///     .debug(true)
///     .build();
/// ```
pub struct Builder {
    debug: bool,
    ceiling: usize,
    hooks: Arc<dyn WaitHooks>,
}

impl Builder {
    /// Creates a builder with default settings.
    ///
    /// Debug tracing follows the flag captured by [`lifecycle::init`], the
    /// ceiling is [`MAXIMUM_WAIT_OBJECTS`] and the wait hooks are
    /// [`MissingHooks`].
    pub fn new() -> Self {
        Self {
            debug: lifecycle::poll_debug(),
            ceiling: MAXIMUM_WAIT_OBJECTS,
            hooks: Arc::new(MissingHooks),
        }
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Sets the per-call object ceiling used by fan-out.
    ///
    /// # Panics
    ///
    /// Panics if `n < 2`: every group reserves one slot for the stop signal.
    pub fn ceiling(mut self, n: usize) -> Self {
        assert!(n >= 2, "ceiling must be >= 2");

        self.ceiling = n;
        self
    }

    /// Injects the park/wake hooks used by the wait-queue backend.
    pub fn wait_hooks(mut self, hooks: Arc<dyn WaitHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> Config {
        Config {
            debug: self.debug,
            ceiling: self.ceiling,
        }
    }

    /// Builds a wait-queue multiplexer with the configured hooks, whatever
    /// backend the build selected by default.
    pub fn build_wait_queue(self) -> WaitQueue {
        let config = self.config();
        WaitQueue::new(self.hooks, config)
    }

    /// Builds the multiplexer selected for this target.
    pub fn build(self) -> Multiplexer {
        cfg_if::cfg_if! {
            if #[cfg(any(feature = "bare-metal", not(any(unix, windows))))] {
                self.build_wait_queue()
            } else if #[cfg(windows)] {
                let config = self.config();
                crate::backend::FanOut::new(crate::backend::HandleWait::new(config))
            } else if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
                crate::backend::Kqueue::new(self.config())
            } else if #[cfg(all(unix, feature = "select"))] {
                crate::backend::Select::new(self.config())
            } else {
                crate::backend::Poll::new(self.config())
            }
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("debug", &self.debug)
            .field("ceiling", &self.ceiling)
            .finish_non_exhaustive()
    }
}
