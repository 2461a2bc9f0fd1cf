//! Shared state behind a promise and its futures.
//!
//! One [`SharedState`] backs one asynchronous computation. The producer
//! side ([`Promise`](crate::Promise)) and every consumer copy
//! ([`Future`](crate::Future)) hold an `Arc` to the same state. All
//! mutation happens under a single mutex; the transition to `FINISHED` is
//! the synchronization point consumers rely on.

mod continuation;
mod progress;
mod results;

pub(crate) mod status;

pub(crate) use continuation::Continuation;
pub(crate) use progress::Progress;

use self::results::ResultStore;
use self::status::{CANCELED, FINISHED, PAUSED, RUNNING, STARTED, SUSPENDED, has};
use crate::error::{FutureError, ReportError, TaskException};
use crate::future::Future;
use crate::task::Runnable;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{trace, warn};

/// Reference-counted state of one asynchronous computation.
pub(crate) struct SharedState<T> {
    /// Everything that changes over the lifetime of the computation.
    inner: Mutex<Inner<T>>,

    /// Signalled once, when the state becomes `FINISHED`.
    finished: Condvar,

    /// Signalled whenever a result or an exception is stored, and on finish.
    ///
    /// Readers waiting for a specific result index park here so that
    /// waiters on `finished` are only woken by the terminal transition.
    result_ready: Condvar,

    /// Signalled when a paused producer may continue.
    resumed: Condvar,

    /// Mirror of the `CANCELED` flag, polled by producers without locking.
    canceled: AtomicBool,
}

struct Inner<T> {
    status: u8,
    results: ResultStore<T>,
    exception: Option<TaskException>,
    progress: Progress,
    continuation: Option<Continuation<T>>,

    /// Runner that will execute this computation, while it is still queued.
    runnable: Option<Weak<dyn Runnable>>,
}

impl<T> SharedState<T> {
    /// Creates a state with no status flag set.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                status: 0,
                results: ResultStore::new(),
                exception: None,
                progress: Progress::default(),
                continuation: None,
                runnable: None,
            }),
            finished: Condvar::new(),
            result_ready: Condvar::new(),
            resumed: Condvar::new(),
            canceled: AtomicBool::new(false),
        })
    }

    /// Locks the state.
    ///
    /// User code runs under this lock (`Clone` of results, `Drop` of
    /// rejected values, iterators passed to `report_results`). A panic there
    /// leaves every field consistent, so a poisoned lock is taken over.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn status(&self) -> u8 {
        self.lock().status
    }

    /// Lock-free check of the cancellation flag.
    pub(crate) fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Records the runner that will execute this computation.
    pub(crate) fn bind_runnable(&self, runnable: Weak<dyn Runnable>) {
        self.lock().runnable = Some(runnable);
    }

    /// Transitions a created state to `STARTED | RUNNING`.
    ///
    /// Returns `false` if the state was already started or finished.
    pub(crate) fn report_started(&self) -> bool {
        let mut inner = self.lock();

        if inner.status & (STARTED | FINISHED) != 0 {
            return false;
        }

        inner.status |= STARTED | RUNNING;
        inner.runnable = None;

        trace!(status = inner.status, "computation started");
        true
    }

    /// Stores a result at `index`, or appends it when `index` is `None`.
    pub(crate) fn report_result(&self, value: T, index: Option<usize>) -> Result<usize, ReportError> {
        let mut inner = self.lock();

        if inner.status & (CANCELED | FINISHED) != 0 {
            return Err(ReportError::AlreadyFinished);
        }

        let index = inner.results.insert(value, index)?;
        drop(inner);

        self.result_ready.notify_all();
        Ok(index)
    }

    /// Appends every value of `values`, returning how many were stored.
    pub(crate) fn report_results<I>(&self, values: I) -> Result<usize, ReportError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut inner = self.lock();

        if inner.status & (CANCELED | FINISHED) != 0 {
            return Err(ReportError::AlreadyFinished);
        }

        let mut stored = 0;
        for value in values {
            inner.results.insert(value, None)?;
            stored += 1;
        }
        drop(inner);

        if stored > 0 {
            self.result_ready.notify_all();
        }
        Ok(stored)
    }

    /// Stores the exception of the computation. The first exception wins.
    pub(crate) fn report_exception(&self, exception: TaskException) -> Result<(), ReportError> {
        let mut inner = self.lock();

        if has(inner.status, FINISHED) {
            return Err(ReportError::AlreadyFinished);
        }

        if inner.exception.is_some() {
            return Err(ReportError::ExceptionTaken);
        }

        trace!(%exception, "exception stored");
        inner.exception = Some(exception);
        drop(inner);

        self.result_ready.notify_all();
        Ok(())
    }

    /// Performs the terminal transition and runs the continuation.
    ///
    /// Returns `false`, doing nothing, if the state had already finished.
    pub(crate) fn report_finished(self: &Arc<Self>) -> bool {
        let continuation = {
            let mut inner = self.lock();

            if has(inner.status, FINISHED) {
                trace!("finish reported twice; ignored");
                return false;
            }

            inner.status &= !(RUNNING | PAUSED | SUSPENDED);
            inner.status |= FINISHED;
            inner.runnable = None;

            trace!(
                status = inner.status,
                results = inner.results.len(),
                "computation finished"
            );

            inner.continuation.take()
        };

        self.finished.notify_all();
        self.result_ready.notify_all();
        self.resumed.notify_all();

        if let Some(continuation) = continuation {
            continuation.invoke(Future::from_state(self.clone()));
        }

        true
    }

    /// Requests cooperative cancellation.
    ///
    /// Returns the runner of the computation if it has not started yet,
    /// so the caller can pull it out of its queue. The returned handle must
    /// be dropped after this call returns, never under the state lock.
    pub(crate) fn cancel(&self) -> Option<Arc<dyn Runnable>> {
        let mut inner = self.lock();

        if has(inner.status, CANCELED) {
            return None;
        }

        inner.status &= !(PAUSED | SUSPENDED);
        inner.status |= CANCELED;
        self.canceled.store(true, Ordering::Release);

        trace!(status = inner.status, "cancellation requested");

        let pending = if inner.status & (STARTED | FINISHED) == 0 {
            inner.runnable.as_ref().and_then(Weak::upgrade)
        } else {
            None
        };
        drop(inner);

        self.resumed.notify_all();
        pending
    }

    /// Cancels and finishes in one step, for producers that give up.
    pub(crate) fn cancel_and_finish(self: &Arc<Self>) {
        {
            let mut inner = self.lock();

            if has(inner.status, FINISHED) {
                return;
            }

            inner.status |= CANCELED;
            self.canceled.store(true, Ordering::Release);
        }

        self.report_finished();
    }

    /// Installs the continuation, or runs it right away if already finished.
    pub(crate) fn set_continuation(self: &Arc<Self>, continuation: Continuation<T>) {
        let mut inner = self.lock();

        if has(inner.status, FINISHED) {
            drop(inner);
            continuation.invoke(Future::from_state(self.clone()));
            return;
        }

        let replaced = inner.continuation.replace(continuation);
        drop(inner);

        if replaced.is_some() {
            warn!("a continuation was already installed; the previous one is discarded");
        }
    }

    pub(crate) fn suspend(&self) {
        let mut inner = self.lock();

        if inner.status & (CANCELED | FINISHED) != 0 {
            return;
        }

        inner.status |= PAUSED;
    }

    pub(crate) fn resume(&self) {
        let mut inner = self.lock();

        if !has(inner.status, PAUSED) {
            return;
        }

        inner.status &= !(PAUSED | SUSPENDED);
        drop(inner);

        self.resumed.notify_all();
    }

    /// Parks the producer while a pause is requested.
    ///
    /// Returns once the computation is resumed or canceled.
    pub(crate) fn wait_if_suspended(&self) {
        let mut inner = self.lock();

        if !has(inner.status, PAUSED) {
            return;
        }

        inner.status |= SUSPENDED;
        trace!("producer suspended");

        while has(inner.status, PAUSED) && !has(inner.status, CANCELED) {
            inner = self.resumed.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }

        inner.status &= !SUSPENDED;
        trace!("producer resumed");
    }

    /// Runs the queued runner on the calling thread, if it is still queued.
    fn run_pending_inline(&self) {
        let pending = {
            let inner = self.lock();

            if inner.status & (STARTED | FINISHED) != 0 {
                return;
            }

            inner.runnable.as_ref().and_then(Weak::upgrade)
        };

        if let Some(runnable) = pending {
            runnable.run_inline();
        }
    }

    /// Blocks until the state is `FINISHED`.
    pub(crate) fn wait_for_finished(&self) {
        self.run_pending_inline();

        let mut inner = self.lock();
        while !has(inner.status, FINISHED) {
            inner = self.finished.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the result at `index` is available or the state is
    /// finished, then reads it.
    pub(crate) fn wait_for_result(&self, index: usize) -> Result<T, FutureError>
    where
        T: Clone,
    {
        self.run_pending_inline();

        let mut inner = self.lock();

        loop {
            if let Some(exception) = &inner.exception {
                return Err(FutureError::Exception(exception.clone()));
            }

            if let Some(value) = inner.results.get(index) {
                return Ok(value.clone());
            }

            if has(inner.status, FINISHED) {
                break;
            }

            inner = self.result_ready.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }

        if has(inner.status, CANCELED) {
            Err(FutureError::Canceled)
        } else {
            Err(FutureError::OutOfRange {
                index,
                count: inner.results.len(),
            })
        }
    }

    /// Blocks until finished, then reads every result in index order.
    pub(crate) fn wait_for_results(&self) -> Result<Vec<T>, FutureError>
    where
        T: Clone,
    {
        self.wait_for_finished();

        let inner = self.lock();

        if let Some(exception) = &inner.exception {
            return Err(FutureError::Exception(exception.clone()));
        }

        Ok(inner.results.values().cloned().collect())
    }

    pub(crate) fn result_count(&self) -> usize {
        self.lock().results.len()
    }

    pub(crate) fn is_result_ready_at(&self, index: usize) -> bool {
        self.lock().results.contains(index)
    }

    pub(crate) fn exception(&self) -> Option<TaskException> {
        self.lock().exception.clone()
    }

    pub(crate) fn progress(&self) -> Progress {
        self.lock().progress.clone()
    }

    pub(crate) fn set_progress_range(&self, minimum: i64, maximum: i64) {
        let mut inner = self.lock();

        if inner.status & (CANCELED | FINISHED) != 0 {
            return;
        }

        inner.progress.set_range(minimum, maximum);
    }

    /// Advances the progress value, optionally replacing the text.
    pub(crate) fn set_progress_value(&self, value: i64, text: Option<String>) -> bool {
        let mut inner = self.lock();

        if inner.status & (CANCELED | FINISHED) != 0 {
            return false;
        }

        inner.progress.advance(value, text)
    }
}
