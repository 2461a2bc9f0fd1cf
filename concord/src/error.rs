//! Error types crossing the promise/future boundary.
//!
//! A task body runs on a worker thread while its result is read on another,
//! so failures are captured as values instead of being propagated through the
//! call stack. [`TaskException`] is what a producer stores; [`FutureError`] is
//! what a consumer receives when it pulls a result.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// A failure captured from a task body.
///
/// The set of variants is closed: typed errors keep their concrete type
/// behind [`TaskException::Failed`], panics with a textual message become
/// [`TaskException::Panicked`], and everything else is wrapped in
/// [`TaskException::Unhandled`] so consumers always receive something they
/// can match on.
#[derive(Debug, Clone, Error)]
pub enum TaskException {
    /// The task returned an error value.
    #[error("task failed: {0}")]
    Failed(Arc<dyn StdError + Send + Sync + 'static>),

    /// The task panicked with a string message.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task panicked with a payload of an unknown type.
    #[error("unhandled exception in task")]
    Unhandled(UnhandledPayload),
}

impl TaskException {
    /// Wraps a typed error.
    pub fn failed<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(error))
    }

    /// Converts a panic payload into an exception.
    ///
    /// A payload that already is a `TaskException` is returned as-is.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<TaskException>() {
            Ok(exception) => return *exception,
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<String>() {
            Ok(message) => return Self::Panicked(*message),
            Err(payload) => payload,
        };

        match payload.downcast::<&'static str>() {
            Ok(message) => Self::Panicked((*message).to_owned()),
            Err(payload) => Self::Unhandled(UnhandledPayload::new(payload)),
        }
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Failed(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Opaque payload of a panic that carried neither a message nor an error.
#[derive(Clone)]
pub struct UnhandledPayload(Arc<Mutex<Box<dyn Any + Send>>>);

impl UnhandledPayload {
    fn new(payload: Box<dyn Any + Send>) -> Self {
        Self(Arc::new(Mutex::new(payload)))
    }

    /// Returns `true` if the payload is of type `P`.
    pub fn is<P: Any>(&self) -> bool {
        self.0.lock().map(|payload| payload.is::<P>()).unwrap_or(false)
    }
}

impl fmt::Debug for UnhandledPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnhandledPayload(..)")
    }
}

/// Error returned when reading results from a [`Future`](crate::Future).
#[derive(Debug, Clone, Error)]
pub enum FutureError {
    /// No result was ever written at the requested index.
    #[error("result index {index} out of range ({count} results available)")]
    OutOfRange { index: usize, count: usize },

    /// The computation was canceled before producing the requested result.
    #[error("computation was canceled")]
    Canceled,

    /// The task body failed; the stored exception is re-raised here.
    #[error(transparent)]
    Exception(#[from] TaskException),

    /// The future is not attached to any computation.
    #[error("future is not attached to a computation")]
    Invalid,
}

/// Rejection of a producer-side write. Never surfaced to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ReportError {
    #[error("computation already finished or canceled")]
    AlreadyFinished,

    #[error("result index {0} already written")]
    IndexTaken(usize),

    #[error("result index {0} leaves no room for a following append")]
    IndexOverflow(usize),

    #[error("an exception was already reported")]
    ExceptionTaken,
}
