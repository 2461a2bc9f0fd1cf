//! Runnable units of work.
//!
//! This module adapts user callables into units a thread pool can execute.
//!
//! It includes:
//! - the [`Runnable`] trait shared by everything a pool can run,
//! - the task runner that drives a promise around a callable,
//! - plain jobs used for fire-and-forget closures and continuations,
//! - panic capture and argument application helpers.

pub(crate) mod guard;
pub(crate) mod job;
pub(crate) mod runner;

mod invoke;

pub use invoke::Invoke;

pub(crate) use job::Job;
pub(crate) use runner::TaskRunner;

use std::sync::Arc;

/// A unit of work that can be executed by a thread pool.
///
/// The trait abstracts over the result type of a task, so a pool can hold
/// a heterogeneous queue of `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Executes the work. Called at most once, by a worker thread or by a
    /// thread waiting on the result.
    fn run(self: Arc<Self>);

    /// Removes this runnable from the queue of its pool.
    ///
    /// Returns the queued handle if it was still waiting to be picked up,
    /// `None` if a worker already took it.
    fn withdraw(self: Arc<Self>) -> Option<Arc<dyn Runnable>>;

    /// Takes this runnable out of the queue of its pool and runs it on the
    /// calling thread, counted as active work of that pool.
    ///
    /// Returns `false` if it was no longer queued.
    fn run_inline(self: Arc<Self>) -> bool;
}
