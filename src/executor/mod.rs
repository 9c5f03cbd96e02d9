//! The task executor contract consumed by the prefetch launcher.
//!
//! The spec treats the executor as an external collaborator, described
//! only by its contract (`numThreads`, `submit`). Per the spec's design
//! note on the source's coroutine-based tasking layer ("the buffer-pool
//! core does NOT itself yield; it only submits prefetch tasks via a
//! trait/interface... the pool's public API is synchronous"), this crate
//! models the contract as a plain `Send + Sync` trait and additionally
//! ships one concrete implementation backed by OS threads, so the crate is
//! usable without every embedder supplying their own executor.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

/// An opaque unit of work submitted to a specific worker thread.
pub type Task = Box<dyn FnOnce() + Send>;

/// Contract for a host-provided task executor, consumed only by the
/// prefetch launcher ([`crate::prefetch`]).
pub trait TaskExecutor: Send + Sync {
    /// Number of worker threads available. Prefetching is disabled (and
    /// `open`/`create` fail with `NoThreadsAvailableForPrefetching`) if
    /// this is zero while a non-zero prefetching degree was requested.
    fn num_threads(&self) -> usize;

    /// Schedule `task` for execution on worker `thread_id`. Fire-and-forget:
    /// no return value, no completion notification.
    fn submit(&self, thread_id: usize, task: Task);
}

/// A minimal fixed-size thread-pool executor.
///
/// Each worker thread owns one channel; `submit` is a non-blocking send to
/// the chosen worker's queue. Dropping the pool closes every channel and
/// joins every worker, draining any tasks already queued.
pub struct ThreadPool {
    senders: Vec<Sender<Task>>,
    handles: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `num_threads` worker threads. `num_threads == 0` is legal: the
    /// resulting executor simply reports zero threads and cannot be used
    /// for prefetching.
    pub fn new(num_threads: usize) -> Self {
        let mut senders = Vec::with_capacity(num_threads);
        let mut handles = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let (tx, rx) = mpsc::channel::<Task>();
            let handle = std::thread::Builder::new()
                .name(format!("bufpool-worker-{id}"))
                .spawn(move || {
                    for task in rx {
                        task();
                    }
                })
                .expect("failed to spawn worker thread");
            senders.push(tx);
            handles.push(handle);
        }

        Self { senders, handles }
    }
}

impl TaskExecutor for ThreadPool {
    fn num_threads(&self) -> usize {
        self.senders.len()
    }

    fn submit(&self, thread_id: usize, task: Task) {
        // A closed receiver (worker panicked) silently drops the task,
        // matching the fire-and-forget contract: prefetch failures must
        // never be observable to the caller that triggered them.
        let _ = self.senders[thread_id].send(task);
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// An executor with zero threads, useful for tests and for embedders that
/// never intend to enable prefetching.
pub struct NoExecutor;

impl TaskExecutor for NoExecutor {
    fn num_threads(&self) -> usize {
        0
    }

    fn submit(&self, _thread_id: usize, _task: Task) {
        unreachable!("NoExecutor has no threads to submit to");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_num_threads() {
        let pool = ThreadPool::new(3);
        assert_eq!(pool.num_threads(), 3);
    }

    #[test]
    fn test_submit_runs_task() {
        let pool = ThreadPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        pool.submit(0, Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        drop(pool); // joins workers, draining the queue
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_threads() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.num_threads(), 0);
    }

    #[test]
    fn test_no_executor_reports_zero() {
        assert_eq!(NoExecutor.num_threads(), 0);
    }
}
