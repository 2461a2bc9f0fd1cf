//! Consumer handles onto asynchronous computations.
//!
//! A [`Future`] is a cheap, clonable view of a computation driven by a
//! [`Promise`](crate::Promise). Copies share the same state: cancelling
//! through one copy is observed by all of them, and results are read
//! without consuming them.
//!
//! Reading is blocking. [`Future::result`] and [`Future::results`] park
//! the calling thread until the value is available, then re-raise a stored
//! exception instead of returning a value.

mod chain;

use crate::error::{FutureError, TaskException};
use crate::promise::Promise;
use crate::state::SharedState;
use crate::state::status::{CANCELED, FINISHED, PAUSED, RUNNING, STARTED, SUSPENDED, has};

use std::fmt;
use std::sync::Arc;

/// Consumer handle onto an asynchronous computation.
///
/// # Examples
///
/// ```rust
/// use concord::ThreadPool;
///
/// let pool = ThreadPool::new(2);
/// let future = concord::run_on(Some(&pool), || 6 * 7);
///
/// assert_eq!(future.result().unwrap(), 42);
/// ```
pub struct Future<T> {
    /// `None` for a future that was never attached to a computation.
    pub(crate) state: Option<Arc<SharedState<T>>>,
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state: Some(state) }
    }

    /// A detached future behaves like one that was canceled before it
    /// started: it is finished, canceled and has no result.
    fn status(&self) -> u8 {
        match &self.state {
            Some(state) => state.status(),
            None => CANCELED | FINISHED,
        }
    }

    /// Returns `true` if this future is attached to a computation.
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_started(&self) -> bool {
        has(self.status(), STARTED)
    }

    /// Returns `true` while the producer is executing the computation.
    pub fn is_running(&self) -> bool {
        let status = self.status();
        has(status, RUNNING) && !has(status, FINISHED)
    }

    pub fn is_finished(&self) -> bool {
        has(self.status(), FINISHED)
    }

    pub fn is_canceled(&self) -> bool {
        has(self.status(), CANCELED)
    }

    /// Returns `true` if a pause was requested but the producer has not
    /// reached a suspension point yet.
    pub fn is_suspending(&self) -> bool {
        let status = self.status();
        has(status, PAUSED) && !has(status, SUSPENDED)
    }

    /// Returns `true` while the producer is parked in
    /// [`Promise::suspend_if_requested`](crate::Promise::suspend_if_requested).
    pub fn is_suspended(&self) -> bool {
        has(self.status(), SUSPENDED)
    }

    /// Blocks until the computation is finished.
    ///
    /// If the computation is still queued in a thread pool, it is taken out
    /// of the queue and run on the calling thread instead of waiting for a
    /// worker to pick it up.
    pub fn wait_for_finished(&self) {
        if let Some(state) = &self.state {
            state.wait_for_finished();
        }
    }

    /// Requests cooperative cancellation.
    ///
    /// A computation still waiting in a pool queue is removed from it and
    /// finishes canceled without running. A running one is expected to
    /// notice through [`Promise::is_canceled`](crate::Promise::is_canceled).
    /// Cancelling a finished computation keeps its results.
    pub fn cancel(&self) {
        let Some(state) = &self.state else {
            return;
        };

        if let Some(runnable) = state.cancel() {
            // Dropping the withdrawn runner drops its promise, which
            // finishes the computation.
            drop(runnable.withdraw());
        }
    }

    /// Asks the producer to pause at its next suspension point.
    pub fn suspend(&self) {
        if let Some(state) = &self.state {
            state.suspend();
        }
    }

    /// Lets a paused producer continue.
    pub fn resume(&self) {
        if let Some(state) = &self.state {
            state.resume();
        }
    }

    pub fn set_suspended(&self, suspend: bool) {
        if suspend {
            self.suspend();
        } else {
            self.resume();
        }
    }

    pub fn toggle_suspended(&self) {
        self.set_suspended(!has(self.status(), PAUSED));
    }

    /// Returns the number of results reported so far.
    pub fn result_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.result_count())
    }

    /// Returns `true` if a result was written at `index`.
    pub fn is_result_ready_at(&self, index: usize) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.is_result_ready_at(index))
    }

    /// Returns the stored exception without blocking.
    pub fn exception(&self) -> Option<TaskException> {
        self.state.as_ref().and_then(|state| state.exception())
    }

    pub fn progress_minimum(&self) -> i64 {
        self.state.as_ref().map_or(0, |state| state.progress().minimum)
    }

    pub fn progress_maximum(&self) -> i64 {
        self.state.as_ref().map_or(0, |state| state.progress().maximum)
    }

    pub fn progress_value(&self) -> i64 {
        self.state.as_ref().map_or(0, |state| state.progress().value)
    }

    pub fn progress_text(&self) -> String {
        self.state
            .as_ref()
            .map(|state| state.progress().text)
            .unwrap_or_default()
    }
}

impl<T: Clone> Future<T> {
    /// Returns the first result, blocking until it is available.
    ///
    /// Equivalent to `result_at(0)`.
    pub fn result(&self) -> Result<T, FutureError> {
        self.result_at(0)
    }

    /// Returns the result at `index`, blocking until it is available or
    /// the computation finished.
    ///
    /// # Errors
    ///
    /// - [`FutureError::Exception`] if the task failed, on every call.
    /// - [`FutureError::Canceled`] if the computation was canceled before
    ///   writing `index`.
    /// - [`FutureError::OutOfRange`] if it finished without writing `index`.
    /// - [`FutureError::Invalid`] for a detached future.
    pub fn result_at(&self, index: usize) -> Result<T, FutureError> {
        match &self.state {
            Some(state) => state.wait_for_result(index),
            None => Err(FutureError::Invalid),
        }
    }

    /// Returns every result in index order once the computation finished.
    ///
    /// A computation canceled before reporting anything yields an empty
    /// vector; check [`is_canceled`](Self::is_canceled) to tell it apart.
    pub fn results(&self) -> Result<Vec<T>, FutureError> {
        match &self.state {
            Some(state) => state.wait_for_results(),
            None => Err(FutureError::Invalid),
        }
    }
}

impl<T> Future<T> {
    /// Returns a finished future holding `value`.
    pub fn ready(value: T) -> Self {
        Self::ready_many(std::iter::once(value))
    }

    /// Returns a finished future holding every value of `values`.
    pub fn ready_many<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let promise = Promise::new();
        promise.start();
        promise.add_results(values);
        promise.finish();

        promise.future()
    }

    /// Returns a finished future holding `exception`.
    pub fn failed(exception: TaskException) -> Self {
        let promise = Promise::new();
        promise.start();
        promise.set_exception(exception);
        promise.finish();

        promise.future()
    }

    /// Returns a future that was canceled before it started.
    pub fn canceled() -> Self {
        let promise = Promise::new();
        let future = promise.future();
        future.cancel();
        promise.finish();

        future
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for Future<T> {
    /// Returns a detached future.
    fn default() -> Self {
        Self { state: None }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("valid", &self.is_valid())
            .field("finished", &self.is_finished())
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
