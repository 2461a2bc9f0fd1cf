//! Worker pools.
//!
//! A [`ThreadPool`] owns a fixed set of worker threads fed by a shared
//! priority queue. Pools are cheap to clone: clones are handles onto the
//! same workers, and the workers are shut down once the last handle of a
//! pool is dropped.
//!
//! Most computations run on the process-wide pool returned by [`global`].
//! Tests and latency-sensitive callers supply their own pool, either per
//! call or for a whole scope with [`with_default_pool`].

mod builder;
mod global;
mod worker;

pub(crate) mod queue;

pub use builder::ThreadPoolBuilder;
pub use global::{global, with_default_pool};

pub(crate) use global::default_pool;

use self::queue::TaskQueue;
use self::worker::Worker;
use crate::task::{Job, Runnable};

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};

use tracing::debug;

/// A pool of worker threads executing submitted work by priority.
///
/// # Examples
///
/// ```rust
/// use concord::ThreadPool;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pool = ThreadPool::new(2);
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..8 {
///     let counter = counter.clone();
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
/// }
///
/// pool.wait_for_done();
/// assert_eq!(counter.load(Ordering::SeqCst), 8);
/// ```
#[derive(Clone)]
pub struct ThreadPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    /// Queue shared with the workers.
    queue: Arc<TaskQueue>,

    /// Join handles of the worker threads.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Number of worker threads the pool was built with.
    max_threads: usize,
}

impl ThreadPool {
    /// Creates a pool with `worker_threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `worker_threads == 0`.
    pub fn new(worker_threads: usize) -> Self {
        ThreadPoolBuilder::new().worker_threads(worker_threads).build()
    }

    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::new()
    }

    /// Spawns the workers described by `builder`.
    pub(crate) fn start(builder: ThreadPoolBuilder) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let mut workers = Vec::with_capacity(builder.worker_threads);

        for id in 0..builder.worker_threads {
            let worker = Worker::new(id, queue.clone());

            let handle = thread::Builder::new()
                .name(format!("{}-{}", builder.thread_name, id))
                .spawn(move || worker.run())
                .expect("failed to spawn worker thread");

            workers.push(handle);
        }

        debug!(
            threads = builder.worker_threads,
            name = %builder.thread_name,
            "thread pool started"
        );

        Self {
            inner: Arc::new(PoolInner {
                queue,
                workers: Mutex::new(workers),
                max_threads: builder.worker_threads,
            }),
        }
    }

    /// Runs `f` on a worker thread.
    ///
    /// Returns `false` if the pool is shutting down; `f` is dropped unrun.
    pub fn execute<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute_with_priority(0, f)
    }

    /// Runs `f` on a worker thread, ahead of queued work with a lower
    /// priority.
    pub fn execute_with_priority<F>(&self, priority: i32, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Job::new(f), priority)
    }

    /// Enqueues a runnable. A refused runnable is dropped before returning.
    pub(crate) fn submit(&self, task: Arc<dyn Runnable>, priority: i32) -> bool {
        match self.inner.queue.push(task, priority) {
            Ok(()) => true,
            Err(refused) => {
                drop(refused);
                false
            }
        }
    }

    pub(crate) fn queue(&self) -> Weak<TaskQueue> {
        Arc::downgrade(&self.inner.queue)
    }

    /// Returns the number of worker threads.
    pub fn max_threads(&self) -> usize {
        self.inner.max_threads
    }

    /// Returns the number of tasks currently executing, on workers or
    /// inline on waiting threads.
    pub fn active_count(&self) -> usize {
        self.inner.queue.active()
    }

    /// Returns the number of tasks waiting for a worker.
    pub fn queued_count(&self) -> usize {
        self.inner.queue.len()
    }

    /// Blocks until the queue is empty and no task is executing.
    ///
    /// Tasks taken out of the queue by a thread waiting on their result
    /// count as executing until they return.
    pub fn wait_for_done(&self) {
        self.inner.queue.wait_idle();
    }

    /// Removes every task still waiting for a worker.
    ///
    /// The futures of removed computations finish canceled.
    pub fn clear(&self) {
        let removed = self.inner.queue.clear();
        debug!(removed = removed.len(), "thread pool queue cleared");
    }
}

impl Drop for PoolInner {
    /// Shuts the pool down.
    ///
    /// Queued work is drained by the workers before they exit. Work
    /// submitted afterwards is refused, which cancels it.
    fn drop(&mut self) {
        self.queue.shutdown();

        let current = thread::current().id();
        let workers = std::mem::take(&mut *self.workers.lock().unwrap());

        for handle in workers {
            // The last handle may be released by a job running on this pool.
            if handle.thread().id() == current {
                continue;
            }

            let _ = handle.join();
        }

        drop(self.queue.clear());
        debug!("thread pool stopped");
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("max_threads", &self.max_threads())
            .field("active", &self.active_count())
            .field("queued", &self.queued_count())
            .finish()
    }
}
