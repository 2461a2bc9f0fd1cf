use crate::future::Future;

use tracing::trace;

/// Waits for a group of futures to finish.
///
/// Futures are waited on together: completion order does not matter, and
/// [`wait_for_finished`](Self::wait_for_finished) returns once every held
/// future is finished. Dropping the synchronizer waits as well, so no
/// future registered with it is abandoned mid-flight.
///
/// # Examples
///
/// ```rust
/// use concord::{FutureSynchronizer, ThreadPool};
///
/// let pool = ThreadPool::new(2);
/// let mut synchronizer = FutureSynchronizer::new();
///
/// for x in 0..4 {
///     synchronizer.add_future(concord::run_on(Some(&pool), move || x + 1));
/// }
///
/// synchronizer.wait_for_finished();
/// assert!(synchronizer.futures().iter().all(|f| f.is_finished()));
/// ```
pub struct FutureSynchronizer<T> {
    futures: Vec<Future<T>>,

    /// Cancel every held future before waiting on it.
    cancel_on_wait: bool,
}

impl<T> FutureSynchronizer<T> {
    /// Creates an empty synchronizer that does not cancel on wait.
    pub fn new() -> Self {
        Self {
            futures: Vec::new(),
            cancel_on_wait: false,
        }
    }

    /// Creates a synchronizer holding `future`.
    pub fn with_future(future: Future<T>) -> Self {
        let mut synchronizer = Self::new();
        synchronizer.add_future(future);
        synchronizer
    }

    pub fn add_future(&mut self, future: Future<T>) {
        self.futures.push(future);
    }

    /// Waits for the held futures, then replaces them with `future`.
    pub fn set_future(&mut self, future: Future<T>) {
        self.wait_for_finished();
        self.futures.clear();
        self.add_future(future);
    }

    /// Forgets every held future without waiting for it.
    pub fn clear_futures(&mut self) {
        self.futures.clear();
    }

    pub fn futures(&self) -> &[Future<T>] {
        &self.futures
    }

    pub fn cancel_on_wait(&self) -> bool {
        self.cancel_on_wait
    }

    pub fn set_cancel_on_wait(&mut self, enabled: bool) {
        self.cancel_on_wait = enabled;
    }

    /// Blocks until every held future is finished.
    ///
    /// With cancel-on-wait enabled, every future is asked to cancel before
    /// the first wait, so queued work is dropped and running work can stop
    /// early. Futures that already finished keep their results.
    pub fn wait_for_finished(&self) {
        if self.cancel_on_wait {
            trace!(futures = self.futures.len(), "cancelling futures before waiting");

            for future in &self.futures {
                future.cancel();
            }
        }

        for future in &self.futures {
            future.wait_for_finished();
        }
    }
}

impl<T> Default for FutureSynchronizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for FutureSynchronizer<T> {
    /// Waits for every held future before releasing them.
    fn drop(&mut self) {
        self.wait_for_finished();
    }
}
