use super::{ThreadPool, ThreadPoolBuilder};

use std::cell::RefCell;
use std::sync::OnceLock;

use tracing::debug;

static GLOBAL: OnceLock<ThreadPool> = OnceLock::new();

thread_local! {
    /// Pool used instead of the global one on the current thread.
    static DEFAULT_POOL: RefCell<Option<ThreadPool>> = const { RefCell::new(None) };
}

/// Returns the process-wide pool, building it on first use.
///
/// The global pool has one worker per logical CPU and lives until the
/// process exits.
pub fn global() -> &'static ThreadPool {
    GLOBAL.get_or_init(|| {
        debug!("initializing global thread pool");

        ThreadPoolBuilder::new().thread_name("concord-global").build()
    })
}

/// Runs `f` with `pool` installed as the default pool of the current thread.
///
/// Inside `f`, computations dispatched without an explicit pool run on
/// `pool` instead of the global one. The previous default is restored
/// afterwards.
///
/// # Examples
///
/// ```rust
/// use concord::{ThreadPool, pool};
///
/// let isolated = ThreadPool::new(1);
/// let future = pool::with_default_pool(&isolated, || concord::run(|| "isolated"));
///
/// assert_eq!(future.result().unwrap(), "isolated");
/// ```
pub fn with_default_pool<R>(pool: &ThreadPool, f: impl FnOnce() -> R) -> R {
    let previous = DEFAULT_POOL.with(|cell| cell.replace(Some(pool.clone())));
    let _restore = RestoreDefault(previous);

    f()
}

/// Puts back the default pool that was installed before an override,
/// including when the scope unwinds.
struct RestoreDefault(Option<ThreadPool>);

impl Drop for RestoreDefault {
    fn drop(&mut self) {
        let previous = self.0.take();
        DEFAULT_POOL.with(|cell| cell.replace(previous));
    }
}

/// Returns the pool dispatch resolves to when none is given.
pub(crate) fn default_pool() -> ThreadPool {
    DEFAULT_POOL
        .with(|cell| cell.borrow().clone())
        .unwrap_or_else(|| global().clone())
}
