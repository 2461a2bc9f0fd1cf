//! # Concord
//!
//! **Concord** is a promise/future execution engine for Rust, the task
//! orchestration layer the **Nebula** ecosystem uses for blocking,
//! CPU-bound work that does not belong on an async reactor.
//!
//! A computation is backed by one shared state, written by a single
//! [`Promise`] and read by any number of [`Future`] copies. Callables are
//! submitted to a [`ThreadPool`] through the [`run()`] family of entry points;
//! a worker drives the promise while callers poll, block on, or chain
//! continuations onto the future.
//!
//! Concord offers:
//!
//! - **Promises and futures** sharing multi-result, indexable state
//! - **Cooperative cancellation**, pause and resume
//! - **Progress reporting** with a range, a value, and a text
//! - **Continuations** (`then`, `on_failed`, `on_canceled`) inline or on a pool
//! - **Failure capture**: errors and panics of a task body are stored and
//!   re-raised when a consumer reads a result
//! - **Priority thread pools**, with a lazily built global pool
//! - A [`FutureSynchronizer`] waiting for groups of futures
//!
//! ## Quick Start
//!
//! ```rust
//! use concord::{FutureSynchronizer, ThreadPool};
//!
//! let pool = ThreadPool::new(2);
//!
//! let squares: Vec<_> = (1..=3)
//!     .map(|x| concord::run_on(Some(&pool), move || x * x))
//!     .collect();
//!
//! let total: i32 = squares.iter().map(|f| f.result().unwrap()).sum();
//! assert_eq!(total, 14);
//!
//! let streamed = concord::RunConfig::new()
//!     .pool(&pool)
//!     .run_with_promise::<u32, _>(|promise| {
//!         promise.set_progress_range(0, 3);
//!         for i in 1..=3 {
//!             if promise.is_canceled() {
//!                 return;
//!             }
//!             promise.add_result(i);
//!             promise.set_progress_value(i as i64);
//!         }
//!     });
//!
//! let synchronizer = FutureSynchronizer::with_future(streamed.clone());
//! synchronizer.wait_for_finished();
//! assert_eq!(streamed.results().unwrap(), vec![1, 2, 3]);
//! ```
//!
//! ## Modules
//!
//! - [`pool`] — Thread pools, the global pool, and the default pool override
//! - [`sync`] — Aggregation of several futures
//! - [`task`] — Argument application used by [`run!`]

mod dispatch;
mod error;
mod future;
mod macros;
mod promise;
mod state;

pub mod pool;
pub mod sync;
pub mod task;

pub use dispatch::{PoolSelection, RunConfig, run, run_on, run_with_promise, try_run};
pub use error::{FutureError, TaskException, UnhandledPayload};
pub use future::Future;
pub use pool::{ThreadPool, ThreadPoolBuilder};
pub use promise::Promise;
pub use sync::FutureSynchronizer;
