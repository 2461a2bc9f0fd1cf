use crate::error::{ReportError, TaskException};
use crate::future::Future;
use crate::state::SharedState;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// The producer side of an asynchronous computation.
///
/// A `Promise` writes results, progress and failures into a shared state
/// that any number of [`Future`]s read from. It is not `Clone`: a
/// computation has a single logical writer.
///
/// A producer calls [`start`](Self::start), reports its results, and calls
/// [`finish`](Self::finish) exactly once. A promise dropped before it
/// finished cancels and finishes the computation, so consumers are never
/// left waiting on a producer that went away.
///
/// # Examples
///
/// ```rust
/// use concord::Promise;
///
/// let promise = Promise::new();
/// let future = promise.future();
///
/// promise.start();
/// promise.add_result(7);
/// promise.finish();
///
/// assert_eq!(future.result().unwrap(), 7);
/// ```
pub struct Promise<T> {
    pub(crate) state: Arc<SharedState<T>>,
}

impl<T> Promise<T> {
    /// Creates a promise backed by a fresh shared state.
    pub fn new() -> Self {
        Self {
            state: SharedState::new(),
        }
    }

    /// Returns a consumer handle onto this computation.
    pub fn future(&self) -> Future<T> {
        Future::from_state(self.state.clone())
    }

    /// Marks the computation as started. Does nothing if already started.
    pub fn start(&self) {
        self.state.report_started();
    }

    /// Marks the computation as finished and runs its continuation.
    ///
    /// Calling it again has no effect.
    pub fn finish(&self) {
        self.state.report_finished();
    }

    /// Appends a result at the next free index.
    ///
    /// Returns `false` if the computation was already canceled or finished.
    pub fn add_result(&self, value: T) -> bool {
        accepted(self.state.report_result(value, None))
    }

    /// Stores a result at `index`.
    ///
    /// Returns `false` if the computation was already canceled or finished,
    /// or if a result was already written at `index`; the first write to an
    /// index wins.
    pub fn add_result_at(&self, value: T, index: usize) -> bool {
        accepted(self.state.report_result(value, Some(index)))
    }

    /// Appends every value of `values`.
    pub fn add_results<I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        accepted(self.state.report_results(values))
    }

    /// Stores the failure of the computation. Only the first one is kept.
    pub fn set_exception(&self, exception: TaskException) {
        accepted(self.state.report_exception(exception));
    }

    /// Stores a typed error as the failure of the computation.
    pub fn set_error<E>(&self, error: E)
    where
        E: StdError + Send + Sync + 'static,
    {
        self.set_exception(TaskException::failed(error));
    }

    pub fn set_progress_range(&self, minimum: i64, maximum: i64) {
        self.state.set_progress_range(minimum, maximum);
    }

    /// Reports a new progress value.
    ///
    /// Values that would move progress backwards, or fall outside a
    /// non-empty range, are ignored.
    pub fn set_progress_value(&self, value: i64) {
        self.state.set_progress_value(value, None);
    }

    pub fn set_progress_value_and_text(&self, value: i64, text: impl Into<String>) {
        self.state.set_progress_value(value, Some(text.into()));
    }

    /// Returns `true` once a consumer asked for cancellation.
    ///
    /// Long-running producers are expected to poll this and stop early.
    pub fn is_canceled(&self) -> bool {
        self.state.is_canceled()
    }

    /// Blocks the producer thread while a consumer has paused the
    /// computation. Returns when it is resumed or canceled.
    pub fn suspend_if_requested(&self) {
        self.state.wait_if_suspended();
    }
}

/// Logs a rejected report and folds it into a boolean.
fn accepted<V>(report: Result<V, ReportError>) -> bool {
    match report {
        Ok(_) => true,
        Err(error) => {
            trace!(%error, "report rejected");
            false
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").finish_non_exhaustive()
    }
}

impl<T> Drop for Promise<T> {
    /// Cancels and finishes a computation that was never finished.
    fn drop(&mut self) {
        self.state.cancel_and_finish();
    }
}
