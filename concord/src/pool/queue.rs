use crate::task::Runnable;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex};

/// Priority queue shared by the workers of one pool.
///
/// Higher priorities are dequeued first; tasks of equal priority are
/// dequeued in submission order. The queue also tracks how many tasks
/// workers are currently executing, so callers can wait for the pool to
/// go idle.
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,

    /// Signalled when a task is pushed or shutdown begins.
    available: Condvar,

    /// Signalled when the queue is empty and no task is executing.
    idle: Condvar,
}

struct QueueState {
    heap: BinaryHeap<Entry>,

    /// Submission counter, used to keep FIFO order within a priority.
    sequence: u64,

    /// Tasks taken by workers and not completed yet.
    active: usize,

    shutdown: bool,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.heap.is_empty() && self.active == 0
    }
}

struct Entry {
    priority: i32,
    sequence: u64,
    task: Arc<dyn Runnable>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

/// Address of the runnable behind a trait object, ignoring its vtable.
fn address(task: &Arc<dyn Runnable>) -> *const () {
    Arc::as_ptr(task) as *const ()
}

/// Pulls the queued entry holding `task` out of the heap.
fn extract(state: &mut QueueState, task: &Arc<dyn Runnable>) -> Option<Arc<dyn Runnable>> {
    let target = address(task);
    let mut taken = None;

    state.heap.retain(|entry| {
        if taken.is_none() && address(&entry.task) == target {
            taken = Some(entry.task.clone());
            false
        } else {
            true
        }
    });

    taken
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                sequence: 0,
                active: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    /// Enqueues a task.
    ///
    /// After shutdown the task is handed back so the caller can drop it
    /// outside the queue lock.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>, priority: i32) -> Result<(), Arc<dyn Runnable>> {
        let mut state = self.state.lock().unwrap();

        if state.shutdown {
            return Err(task);
        }

        let sequence = state.sequence;
        state.sequence += 1;
        state.heap.push(Entry {
            priority,
            sequence,
            task,
        });

        drop(state);
        self.available.notify_one();

        Ok(())
    }

    /// Blocks until a task is available and takes it.
    ///
    /// Returns `None` once shutdown was requested and the queue is drained.
    /// Every task returned must be followed by a call to [`complete`](Self::complete).
    pub(crate) fn next(&self) -> Option<Arc<dyn Runnable>> {
        let mut state = self.state.lock().unwrap();

        loop {
            if let Some(entry) = state.heap.pop() {
                state.active += 1;
                return Some(entry.task);
            }

            if state.shutdown {
                return None;
            }

            state = self.available.wait(state).unwrap();
        }
    }

    /// Marks a task taken with [`next`](Self::next) as done.
    pub(crate) fn complete(&self) {
        let mut state = self.state.lock().unwrap();
        state.active -= 1;

        if state.is_idle() {
            self.idle.notify_all();
        }
    }

    /// Removes `task` if it is still queued.
    pub(crate) fn remove(&self, task: &Arc<dyn Runnable>) -> Option<Arc<dyn Runnable>> {
        let mut state = self.state.lock().unwrap();
        let taken = extract(&mut state, task);

        if taken.is_some() && state.is_idle() {
            self.idle.notify_all();
        }

        taken
    }

    /// Removes `task` if it is still queued and counts it as active, for a
    /// caller that runs it outside the workers.
    ///
    /// A task returned here must be followed by a call to
    /// [`complete`](Self::complete), like one returned by [`next`](Self::next).
    pub(crate) fn take(&self, task: &Arc<dyn Runnable>) -> Option<Arc<dyn Runnable>> {
        let mut state = self.state.lock().unwrap();
        let taken = extract(&mut state, task);

        if taken.is_some() {
            state.active += 1;
        }

        taken
    }

    /// Removes every queued task, returning them to be dropped by the caller.
    pub(crate) fn clear(&self) -> Vec<Arc<dyn Runnable>> {
        let mut state = self.state.lock().unwrap();
        let drained = state.heap.drain().map(|entry| entry.task).collect();

        if state.is_idle() {
            self.idle.notify_all();
        }

        drained
    }

    /// Stops accepting tasks and wakes every parked worker.
    ///
    /// Workers keep running until the queue is drained.
    pub(crate) fn shutdown(&self) {
        self.state.lock().unwrap().shutdown = true;
        self.available.notify_all();
    }

    /// Blocks until the queue is empty and no task is executing.
    pub(crate) fn wait_idle(&self) {
        let mut state = self.state.lock().unwrap();

        while !state.is_idle() {
            state = self.idle.wait(state).unwrap();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    pub(crate) fn active(&self) -> usize {
        self.state.lock().unwrap().active
    }
}
