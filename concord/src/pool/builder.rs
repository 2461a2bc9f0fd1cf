use super::ThreadPool;

use std::thread;

/// Builder for configuring and creating a thread pool.
///
/// # Examples
///
/// ```rust
/// use concord::ThreadPoolBuilder;
///
/// let pool = ThreadPoolBuilder::new()
///     .worker_threads(4)
///     .thread_name("decoder")
///     .build();
///
/// assert_eq!(pool.max_threads(), 4);
/// ```
pub struct ThreadPoolBuilder {
    /// Number of worker threads.
    pub(crate) worker_threads: usize,

    /// Prefix of worker thread names, followed by the worker index.
    pub(crate) thread_name: String,
}

impl ThreadPoolBuilder {
    /// Creates a builder with default configuration.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name: String::from("concord-worker"),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the prefix used to name worker threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Builds the pool and starts its workers.
    ///
    /// # Panics
    ///
    /// Panics if the operating system fails to spawn a worker thread.
    pub fn build(self) -> ThreadPool {
        ThreadPool::start(self)
    }
}

impl Default for ThreadPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
