use super::queue::TaskQueue;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

/// A worker thread of a pool.
///
/// Workers share the queue of their pool and execute tasks in priority
/// order until the pool shuts down and the queue is drained.
pub(crate) struct Worker {
    /// Identifier of the worker within its pool.
    id: usize,

    queue: Arc<TaskQueue>,
}

impl Worker {
    pub(crate) fn new(id: usize, queue: Arc<TaskQueue>) -> Self {
        Self { id, queue }
    }

    /// Runs the worker loop.
    ///
    /// Task runners capture panics of their bodies themselves; a panic
    /// escaping a raw job is logged and the worker keeps going.
    pub(crate) fn run(&self) {
        debug!(worker = self.id, "worker started");

        while let Some(task) = self.queue.next() {
            if panic::catch_unwind(AssertUnwindSafe(move || task.run())).is_err() {
                error!(worker = self.id, "job panicked on worker thread");
            }

            self.queue.complete();
        }

        debug!(worker = self.id, "worker stopped");
    }
}
