use super::Runnable;

use std::sync::{Arc, Mutex};

/// A fire-and-forget closure scheduled on a pool.
///
/// Jobs carry no promise; they back [`ThreadPool::execute`](crate::ThreadPool::execute)
/// and continuations bound to a pool.
pub(crate) struct Job {
    f: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Job {
    pub(crate) fn new<F>(f: F) -> Arc<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        Arc::new(Self {
            f: Mutex::new(Some(Box::new(f))),
        })
    }
}

impl Runnable for Job {
    fn run(self: Arc<Self>) {
        let f = self.f.lock().unwrap().take();

        if let Some(f) = f {
            f();
        }
    }

    fn withdraw(self: Arc<Self>) -> Option<Arc<dyn Runnable>> {
        None
    }

    fn run_inline(self: Arc<Self>) -> bool {
        false
    }
}
