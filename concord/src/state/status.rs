//! Status flags of a shared state.
//!
//! Flags combine: a computation canceled while running carries
//! `STARTED | RUNNING | CANCELED` until its producer finishes it.
//! A state with no flag set has been created but not started.

/// The computation has been started by its producer.
pub(crate) const STARTED: u8 = 1 << 0;

/// The producer is executing the computation.
pub(crate) const RUNNING: u8 = 1 << 1;

/// A consumer asked the producer to pause.
///
/// The producer honors the request the next time it calls
/// `suspend_if_requested`.
pub(crate) const PAUSED: u8 = 1 << 2;

/// The producer is parked inside `suspend_if_requested`.
pub(crate) const SUSPENDED: u8 = 1 << 3;

/// Cancellation was requested.
pub(crate) const CANCELED: u8 = 1 << 4;

/// The computation reached its terminal state.
pub(crate) const FINISHED: u8 = 1 << 5;

/// Returns `true` if every bit of `flag` is set in `status`.
#[inline]
pub(crate) fn has(status: u8, flag: u8) -> bool {
    status & flag == flag
}
