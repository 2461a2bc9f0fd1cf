//! Aggregation of several futures.
//!
//! The current primitives include:
//! - [`FutureSynchronizer`] — waits for a group of futures, optionally
//!   cancelling them first, and never lets one go unfinished when dropped.

mod synchronizer;

pub use synchronizer::FutureSynchronizer;
