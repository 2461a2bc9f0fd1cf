use super::{Runnable, guard};
use crate::error::TaskException;
use crate::pool::queue::TaskQueue;
use crate::promise::Promise;

use std::error::Error as StdError;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

/// Body of a task: writes into the promise, or fails with an exception.
pub(crate) type Body<T> = Box<dyn FnOnce(&Promise<T>) -> Result<(), TaskException> + Send>;

/// Adapts a task body into a [`Runnable`] that drives its promise.
///
/// The runner owns the promise of the computation. Once run, or once
/// dropped without running, the promise is released; in the latter case
/// dropping it cancels and finishes the computation.
pub(crate) struct TaskRunner<T> {
    /// Taken by the first call to `run`.
    work: Mutex<Option<Work<T>>>,

    /// Queue of the pool this runner was submitted to.
    queue: Weak<TaskQueue>,
}

struct Work<T> {
    promise: Promise<T>,
    body: Body<T>,
}

impl<T: Send + 'static> TaskRunner<T> {
    pub(crate) fn new(promise: Promise<T>, body: Body<T>, queue: Weak<TaskQueue>) -> Arc<Self> {
        Arc::new(Self {
            work: Mutex::new(Some(Work { promise, body })),
            queue,
        })
    }

    /// Runs the body between `start` and `finish`.
    ///
    /// A computation canceled while queued is finished without ever
    /// starting, and its body is dropped unrun.
    fn execute(&self) {
        let Some(Work { promise, body }) = self.work.lock().unwrap().take() else {
            return;
        };

        if promise.is_canceled() {
            trace!("task canceled before it started; skipping body");
            promise.finish();
            return;
        }

        promise.start();

        if let Err(exception) = guard::catch(|| body(&promise)).and_then(|outcome| outcome) {
            promise.set_exception(exception);
        }

        promise.finish();
    }
}

impl<T: Send + 'static> Runnable for TaskRunner<T> {
    fn run(self: Arc<Self>) {
        self.execute();
    }

    fn withdraw(self: Arc<Self>) -> Option<Arc<dyn Runnable>> {
        let queue = self.queue.upgrade()?;
        let this: Arc<dyn Runnable> = self;

        queue.remove(&this)
    }

    fn run_inline(self: Arc<Self>) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };

        let this: Arc<dyn Runnable> = self;
        let Some(task) = queue.take(&this) else {
            return false;
        };

        let _active = ActiveGuard(queue.as_ref());
        trace!("running a queued computation on the waiting thread");
        task.run();

        true
    }
}

/// Completes work counted as active on a queue, even if it unwinds.
struct ActiveGuard<'a>(&'a TaskQueue);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// Body reporting the value returned by `f` as the single result.
pub(crate) fn value_body<T, F>(f: F) -> Body<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Box::new(move |promise| {
        promise.add_result(f());
        Ok(())
    })
}

/// Body reporting `Ok` values as the result and `Err` values as the
/// exception, keeping the concrete error type.
pub(crate) fn fallible_body<T, E, F>(f: F) -> Body<T>
where
    T: Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    Box::new(move |promise| {
        let value = f().map_err(TaskException::failed)?;
        promise.add_result(value);
        Ok(())
    })
}

/// Body handing the promise itself to `f`, for tasks that report several
/// results, progress, or honor pause requests.
pub(crate) fn promise_body<T, F>(f: F) -> Body<T>
where
    T: Send + 'static,
    F: FnOnce(&Promise<T>) + Send + 'static,
{
    Box::new(move |promise| {
        f(promise);
        Ok(())
    })
}
