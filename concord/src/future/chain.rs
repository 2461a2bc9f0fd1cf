use super::Future;
use crate::error::{FutureError, TaskException};
use crate::pool::ThreadPool;
use crate::promise::Promise;
use crate::state::Continuation;
use crate::task::guard;

/// How a continuation settles its dependent future, besides succeeding.
enum Settle {
    Cancel,
    Fail(TaskException),
}

impl<T: Send + 'static> Future<T> {
    /// Installs `body` as the continuation of this computation and returns
    /// the future of the dependent computation it drives.
    fn chain<U, F>(&self, context: Option<ThreadPool>, body: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(Future<T>, &Promise<U>) -> Result<(), Settle> + Send + 'static,
    {
        let Some(state) = &self.state else {
            return Future::canceled();
        };

        let promise = Promise::new();
        let dependent = promise.future();

        let continuation = Continuation::new(
            move |parent: Future<T>| {
                promise.start();

                match body(parent, &promise) {
                    Ok(()) => {}
                    Err(Settle::Fail(exception)) => promise.set_exception(exception),
                    Err(Settle::Cancel) => drop(promise.state.cancel()),
                }

                promise.finish();
            },
            context,
        );

        state.set_continuation(continuation);
        dependent
    }

    /// Attaches a continuation that receives the first result.
    ///
    /// The continuation runs on the thread that finishes this computation.
    /// If this computation fails or is canceled, `f` is not called and the
    /// returned future fails or is canceled the same way. A panic inside `f`
    /// becomes the exception of the returned future.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord::Future;
    ///
    /// let doubled = Future::ready(21).then(|value| value * 2);
    /// assert_eq!(doubled.result().unwrap(), 42);
    /// ```
    pub fn then<U, F>(&self, f: F) -> Future<U>
    where
        T: Clone,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.chain(None, move |parent, promise| apply_first(parent, promise, f))
    }

    /// Like [`then`](Self::then), but runs the continuation on `pool`.
    pub fn then_on<U, F>(&self, pool: &ThreadPool, f: F) -> Future<U>
    where
        T: Clone,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.chain(Some(pool.clone()), move |parent, promise| {
            apply_first(parent, promise, f)
        })
    }

    /// Attaches a handler that recovers from a failure.
    ///
    /// When this computation fails, the returned future holds the value
    /// produced by `f`. Otherwise it mirrors this computation.
    pub fn on_failed<F>(&self, f: F) -> Future<T>
    where
        T: Clone,
        F: FnOnce(TaskException) -> T + Send + 'static,
    {
        self.chain(None, move |parent, promise| match parent.exception() {
            Some(exception) => {
                let value = guard::catch(move || f(exception)).map_err(Settle::Fail)?;
                promise.add_result(value);
                Ok(())
            }
            None => forward(parent, promise),
        })
    }

    /// Attaches a handler that replaces a cancellation with a value.
    ///
    /// When this computation is canceled without failing, the returned
    /// future holds the value produced by `f`. Otherwise it mirrors this
    /// computation.
    pub fn on_canceled<F>(&self, f: F) -> Future<T>
    where
        T: Clone,
        F: FnOnce() -> T + Send + 'static,
    {
        self.chain(None, move |parent, promise| {
            if parent.is_canceled() && parent.exception().is_none() {
                let value = guard::catch(f).map_err(Settle::Fail)?;
                promise.add_result(value);
                return Ok(());
            }

            forward(parent, promise)
        })
    }
}

fn apply_first<T, U, F>(parent: Future<T>, promise: &Promise<U>, f: F) -> Result<(), Settle>
where
    T: Clone,
    F: FnOnce(T) -> U,
{
    if parent.is_canceled() && parent.exception().is_none() {
        return Err(Settle::Cancel);
    }

    match parent.result() {
        Ok(value) => {
            let value = guard::catch(move || f(value)).map_err(Settle::Fail)?;
            promise.add_result(value);
            Ok(())
        }
        Err(FutureError::Exception(exception)) => Err(Settle::Fail(exception)),
        Err(_) => Err(Settle::Cancel),
    }
}

/// Copies the outcome of `parent` into `promise`.
fn forward<T: Clone>(parent: Future<T>, promise: &Promise<T>) -> Result<(), Settle> {
    match parent.results() {
        Ok(values) => {
            promise.add_results(values);

            if parent.is_canceled() {
                return Err(Settle::Cancel);
            }
            Ok(())
        }
        Err(FutureError::Exception(exception)) => Err(Settle::Fail(exception)),
        Err(_) => Err(Settle::Cancel),
    }
}
