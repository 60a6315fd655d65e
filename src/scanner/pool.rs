//! Bounded worker pool.
//!
//! Runs one tokio task per input item with at most `cap` tasks in flight
//! (`cap == 0` means unbounded) and hands results back in input order. The
//! engine uses the same pool for hosts and for the ports of each host.

use crate::error::{ScanError, ScanResult};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::trace;

/// A reusable concurrency limit for fan-out / fan-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    cap: usize,
}

impl WorkerPool {
    /// Create a pool running at most `cap` tasks at once; 0 is unbounded.
    pub const fn new(cap: usize) -> Self {
        Self { cap }
    }

    /// A pool that starts every task immediately.
    pub const fn unbounded() -> Self {
        Self { cap: 0 }
    }

    /// The task limit, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        (self.cap > 0).then_some(self.cap)
    }

    /// Run `task` once per item and return the outputs in item order.
    ///
    /// Items beyond the cap wait for a running task to finish before they
    /// are spawned. Completion order has no effect on the returned order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ResourceExhausted`] if no tokio runtime is
    /// available or a task is cancelled by runtime shutdown. Remaining tasks
    /// are aborted and no partial output is returned. A panicking task
    /// resumes the panic on the caller.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> ScanResult<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        Handle::try_current()
            .map_err(|e| ScanError::ResourceExhausted(format!("no async runtime: {}", e)))?;

        let semaphore = self.capacity().map(|cap| Arc::new(Semaphore::new(cap)));
        let total = items.len();
        let mut set = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let permit = match &semaphore {
                Some(sem) => Some(Arc::clone(sem).acquire_owned().await.map_err(|_| {
                    ScanError::ResourceExhausted("worker pool semaphore closed".to_string())
                })?),
                None => None,
            };

            let work = task(item);
            set.spawn(async move {
                let output = work.await;
                drop(permit);
                (index, output)
            });
        }
        trace!(total, cap = self.cap, "all workers dispatched");

        // Single collector: results land in their input slot.
        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, output)) => slots[index] = Some(output),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    return Err(ScanError::ResourceExhausted(format!(
                        "worker task did not complete: {}",
                        e
                    )))
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    ScanError::ResourceExhausted("worker task produced no result".to_string())
                })
            })
            .collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::unbounded()
    }
}
