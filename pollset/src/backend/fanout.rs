//! Fan-out over a backend with a per-call object ceiling.
//!
//! A poll set that fits under the ceiling is waited on directly. A larger
//! one is split into groups of `ceiling - 1` entries; each group is waited
//! on by its own worker thread together with a shared stop signal, while
//! the calling thread waits for the first worker to finish (and on any
//! thread-affine entry, which only it may wait on). Once one side returns
//! the stop signal is raised and every worker is joined before results are
//! merged back into the caller's entries.

use super::Multiplex;

use crate::builder::Config;
use crate::error::{Error, Result};
use crate::fd::PollFd;
use crate::wakeup::Signal;

use std::iter;
use std::panic;
use std::thread;

/// A backend that can wait on a bounded number of objects per call.
pub trait BoundedWait: Sync {
    /// Signal used to stop workers and to report their completion.
    type Signal: Signal;

    fn config(&self) -> &Config;

    fn new_signal(&self) -> Result<Self::Signal>;

    /// Waits on at most [`Config::ceiling`] entries.
    ///
    /// Returns the number of entries with non-empty `revents`.
    fn wait_group(&self, group: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize>;
}

/// Multiplexer splitting oversized poll sets across worker threads.
#[derive(Debug, Clone, Default)]
pub struct FanOut<W> {
    waiter: W,
}

impl<W: BoundedWait> FanOut<W> {
    pub fn new(waiter: W) -> Self {
        Self { waiter }
    }

    pub fn waiter(&self) -> &W {
        &self.waiter
    }

    /// Largest poll set this multiplexer accepts, thread-affine entries
    /// aside.
    pub fn capacity(&self) -> usize {
        let per_group = self.waiter.config().ceiling - 1;
        per_group * per_group
    }
}

impl<W: BoundedWait> Multiplex for FanOut<W> {
    fn multiplex(&self, fds: &mut [PollFd<'_>], timeout_ms: i32) -> Result<usize> {
        let config = self.waiter.config();

        if fds.len() <= config.ceiling {
            return self.waiter.wait_group(fds, timeout_ms).inspect_err(|_| {
                for fd in fds.iter_mut() {
                    fd.clear_revents();
                }
            });
        }

        // One slot of every group goes to the stop signal.
        let per_group = config.ceiling - 1;
        let count = fds.len();

        let (mut affine, mut rest): (Vec<_>, Vec<_>) = fds
            .iter_mut()
            .partition(|fd| fd.source().is_thread_affine());

        let groups = rest.len().div_ceil(per_group);

        if groups > per_group || affine.len() >= config.ceiling {
            return Err(Error::TooManyDescriptors {
                count,
                limit: self.capacity(),
            });
        }

        for fd in rest.iter_mut().chain(affine.iter_mut()) {
            fd.clear_revents();
        }

        if config.debug {
            log::debug!(
                "fan-out: {count} entries over {groups} workers, timeout {timeout_ms}"
            );
        }

        let stop = self.waiter.new_signal()?;
        let done = self.waiter.new_signal()?;

        let (coordinator, workers) = thread::scope(|scope| {
            let handles: Vec<_> = rest
                .chunks_mut(per_group)
                .map(|chunk| {
                    let (stop, done, waiter) = (&stop, &done, &self.waiter);

                    scope.spawn(move || {
                        let mut group: Vec<PollFd<'_>> = iter::once(stop.descriptor())
                            .chain(chunk.iter().map(|fd| **fd))
                            .collect();

                        let result = waiter.wait_group(&mut group, timeout_ms);
                        done.signal();

                        for (fd, waited) in chunk.iter_mut().zip(&group[1..]) {
                            fd.set_revents(waited.revents());
                        }

                        // The stop signal is not a caller entry.
                        result.map(|n| n.saturating_sub(usize::from(group[0].is_ready())))
                    })
                })
                .collect();

            let mut own: Vec<PollFd<'_>> = iter::once(done.descriptor())
                .chain(affine.iter().map(|fd| **fd))
                .collect();

            let coordinator = self
                .waiter
                .wait_group(&mut own, timeout_ms)
                .map(|n| n.saturating_sub(usize::from(own[0].is_ready())));

            stop.signal();

            let workers: Vec<Result<usize>> = handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|p| panic::resume_unwind(p)))
                .collect();

            for (fd, waited) in affine.iter_mut().zip(&own[1..]) {
                fd.set_revents(waited.revents());
            }

            (coordinator, workers)
        });

        let merged = coordinator.and_then(|own| {
            workers
                .into_iter()
                .try_fold(own, |total, worker| Ok(total + worker?))
        });

        match merged {
            Ok(ready) => {
                if config.debug {
                    log::debug!("fan-out: {ready} ready");
                }
                Ok(ready)
            }
            Err(err) => {
                for fd in fds.iter_mut() {
                    fd.clear_revents();
                }
                Err(err)
            }
        }
    }
}
