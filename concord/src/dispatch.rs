//! Entry points submitting callables to a thread pool.
//!
//! Every entry point creates a fresh promise, wraps the callable in a task
//! runner owning that promise, and submits the runner to the resolved pool.
//! The returned [`Future`] observes the computation.

use crate::future::Future;
use crate::pool::{ThreadPool, default_pool};
use crate::promise::Promise;
use crate::task::runner::{self, Body};
use crate::task::{Runnable, TaskRunner};

use std::error::Error as StdError;
use std::sync::Arc;

use tracing::{debug, warn};

/// Which pool a computation is submitted to.
#[derive(Clone, Debug, Default)]
pub enum PoolSelection {
    /// The default pool of the current thread, which is the global pool
    /// unless overridden with [`with_default_pool`](crate::pool::with_default_pool).
    #[default]
    Global,

    /// A caller-supplied pool.
    Pool(ThreadPool),

    /// No pool. Computations are refused: they finish canceled without
    /// running.
    Null,
}

/// Where and how urgently a computation is scheduled.
///
/// # Examples
///
/// ```rust
/// use concord::{RunConfig, ThreadPool};
///
/// let pool = ThreadPool::new(1);
/// let future = RunConfig::new().pool(&pool).priority(5).run(|| 3 * 3);
///
/// assert_eq!(future.result().unwrap(), 9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    selection: PoolSelection,
    priority: i32,
}

impl RunConfig {
    /// Default pool, priority `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits to `pool`.
    pub fn pool(mut self, pool: &ThreadPool) -> Self {
        self.selection = PoolSelection::Pool(pool.clone());
        self
    }

    pub fn selection(mut self, selection: PoolSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the queue priority. Higher priorities are picked up first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Runs `f` and reports its return value as the single result.
    pub fn run<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.dispatch(runner::value_body(f))
    }

    /// Runs `f`, reporting `Ok` as the result and `Err` as the exception.
    pub fn try_run<T, E, F>(&self, f: F) -> Future<T>
    where
        T: Send + 'static,
        E: StdError + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.dispatch(runner::fallible_body(f))
    }

    /// Runs `f` with the promise of the computation, so it can report any
    /// number of results, progress, and honor pause requests.
    ///
    /// The result type usually has to be named explicitly, as in
    /// `run_with_promise::<u32, _>(..)`.
    pub fn run_with_promise<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + 'static,
        F: FnOnce(&Promise<T>) + Send + 'static,
    {
        self.dispatch(runner::promise_body(f))
    }

    fn dispatch<T: Send + 'static>(&self, body: Body<T>) -> Future<T> {
        let promise = Promise::new();
        let state = promise.state.clone();
        let future = promise.future();

        let pool = match &self.selection {
            PoolSelection::Global => default_pool(),
            PoolSelection::Pool(pool) => pool.clone(),
            PoolSelection::Null => {
                warn!("no thread pool to run on; computation refused");
                state.cancel_and_finish();
                return future;
            }
        };

        let runnable: Arc<dyn Runnable> = TaskRunner::new(promise, body, pool.queue());
        state.bind_runnable(Arc::downgrade(&runnable));

        debug!(priority = self.priority, "submitting task");

        if !pool.submit(runnable, self.priority) {
            warn!("thread pool is shutting down; computation canceled");
        }

        future
    }
}

/// Runs `f` on the default pool and returns the future of its result.
///
/// # Examples
///
/// ```rust
/// let future = concord::run(|| "hello".len());
/// assert_eq!(future.result().unwrap(), 5);
/// ```
pub fn run<T, F>(f: F) -> Future<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    RunConfig::new().run(f)
}

/// Runs `f` on `pool`.
///
/// Passing `None` refuses the computation: the returned future is
/// finished and canceled, and `f` never runs.
pub fn run_on<T, F>(pool: Option<&ThreadPool>, f: F) -> Future<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let selection = match pool {
        Some(pool) => PoolSelection::Pool(pool.clone()),
        None => PoolSelection::Null,
    };

    RunConfig::new().selection(selection).run(f)
}

/// Runs a fallible `f` on the default pool.
///
/// An `Err` becomes the exception of the computation, with its concrete
/// type recoverable through [`TaskException::downcast_ref`](crate::TaskException::downcast_ref).
pub fn try_run<T, E, F>(f: F) -> Future<T>
where
    T: Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    RunConfig::new().try_run(f)
}

/// Runs `f` on the default pool, handing it the promise of the computation.
pub fn run_with_promise<T, F>(f: F) -> Future<T>
where
    T: Send + 'static,
    F: FnOnce(&Promise<T>) + Send + 'static,
{
    RunConfig::new().run_with_promise(f)
}
