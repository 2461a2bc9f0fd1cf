use crate::future::Future;
use crate::pool::ThreadPool;

use tracing::warn;

/// Callback scheduled to run once a shared state reaches its terminal state.
///
/// The callback receives an owning [`Future`] of the state that finished,
/// which keeps the state alive until the callback is done with it.
pub(crate) struct Continuation<T> {
    callback: Box<dyn FnOnce(Future<T>) + Send>,
}

impl<T> Continuation<T> {
    /// Wraps `callback`, binding it to `context` when one is given.
    ///
    /// Without a context the callback runs inline on the thread that
    /// finished the computation. With one, it is handed to that pool; a
    /// pool that refuses the job drops the callback, and with it whatever
    /// promise it captured, so the dependent computation finishes canceled.
    pub(crate) fn new<F>(callback: F, context: Option<ThreadPool>) -> Self
    where
        T: Send + 'static,
        F: FnOnce(Future<T>) + Send + 'static,
    {
        let callback: Box<dyn FnOnce(Future<T>) + Send> = match context {
            None => Box::new(callback),
            Some(pool) => Box::new(move |parent: Future<T>| {
                if !pool.execute(move || callback(parent)) {
                    warn!("thread pool refused a continuation; dependent future canceled");
                }
            }),
        };

        Self { callback }
    }

    pub(crate) fn invoke(self, parent: Future<T>) {
        (self.callback)(parent)
    }
}
