//! Error types used by the forever loop, its tasks and its listeners.
//!
//! This module defines three error types:
//!
//! - [`TaskError`] — failures raised out of a single task invocation.
//! - [`ListenerError`] — failures raised by a listener while being notified.
//! - [`DispatchError`] — the aggregate of every listener failure of one broadcast.
//!
//! Types provide helper methods (`as_label`, `as_message`) for logging.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// # Errors produced by task execution.
///
/// Every variant is recovered by the loop: the error is broadcast on
/// [`OnError`](crate::OnError) and the task is invoked again.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task panicked; the panic was caught at the invocation boundary.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use forever::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_message(), "boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns the bare message carried by the error.
    pub fn as_message(&self) -> &str {
        match self {
            TaskError::Fail { error } => error,
            TaskError::Panicked { info } => info,
        }
    }
}

/// # Error raised by a single listener.
///
/// Returned from [`Listener::on_event`](crate::Listener::on_event), or produced by
/// the channel when a listener panics.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Listener reported a failure.
    #[error("listener failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Listener panicked while being notified.
    #[error("listener panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ListenerError {
    /// Shorthand for [`ListenerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ListenerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fail { .. } => "listener_failed",
            ListenerError::Panicked { .. } => "listener_panicked",
        }
    }
}

/// A listener failure paired with the name of the listener that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Listener name (see [`Listener::name`](crate::Listener::name)).
    pub listener: Cow<'static, str>,
    /// What went wrong.
    pub error: ListenerError,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.listener, self.error)
    }
}

/// # Aggregate of listener failures from one broadcast.
///
/// A broadcast always invokes every listener; failures are collected in
/// subscription order. [`DispatchError::first`] is the first one observed.
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use forever::{forever, ListenerError, TaskFn};
///
/// let handle = forever(TaskFn::arc("idle", |_oncancel, _: ()| async { Ok(()) }), ());
/// handle.oncancel().subscribe_fn("a", |_| async { Err(ListenerError::fail("x")) });
/// handle.oncancel().subscribe_fn("b", |_| async { Err(ListenerError::fail("y")) });
///
/// let err = handle.cancel().await.unwrap_err();
/// assert_eq!(err.len(), 2);
/// assert_eq!(err.first().listener, "a");
/// assert_eq!(err.to_string(), "a: listener failed: x (and 1 more)");
/// # }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.failures))]
pub struct DispatchError {
    failures: Vec<ListenerFailure>,
}

impl DispatchError {
    /// Builds an aggregate from a non-empty list of failures.
    ///
    /// # Panics
    /// Panics if `failures` is empty; an empty broadcast result is `Ok(())`.
    pub(crate) fn new(failures: Vec<ListenerFailure>) -> Self {
        assert!(!failures.is_empty(), "DispatchError requires at least one failure");
        Self { failures }
    }

    /// First failure observed (in subscription order).
    pub fn first(&self) -> &ListenerFailure {
        &self.failures[0]
    }

    /// All failures, in subscription order.
    pub fn failures(&self) -> &[ListenerFailure] {
        &self.failures
    }

    /// Number of listeners that failed.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        "dispatch_failed"
    }
}

fn summarize(failures: &[ListenerFailure]) -> String {
    match failures {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
