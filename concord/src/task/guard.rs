use crate::error::TaskException;

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

/// Runs `f`, turning a panic into a [`TaskException`].
///
/// Task bodies run on worker threads that must survive them, and their
/// failures are read on another thread; unwinding is stopped here and the
/// payload travels as a value instead.
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, TaskException> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let exception = TaskException::from_panic(payload);
        debug!(%exception, "panic captured from task body");
        exception
    })
}
