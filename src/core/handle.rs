//! # Control handle: cancellation and error observation.
//!
//! [`ControlHandle`] is returned once, when a loop starts. It shares the loop's
//! state with the background actor:
//!
//! ```text
//!               ┌──────────────── LoopState ────────────────┐
//! ControlHandle │ running: AtomicBool                       │ LoopActor
//!   cancel() ──►│   swap(false) exactly once                │◄── is_running() per iteration
//!               │ oncancel: Channel<()>                     │
//!   oncancel()─►│   subscribe-only view for callers & tasks │
//!               │ onerror:  Channel<TaskError>              │
//!   onerror() ─►│   subscribe-only view                     │◄── dispatch(err) per failure
//!               └───────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The running flag goes true → false **once** and never reverts.
//! - The first `cancel()` wins the flag swap and is the only one that broadcasts.
//! - The flag is flipped when `cancel()` is **called**, before its future is polled.
//! - A failed cancellation broadcast never rolls the flag back.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::{
    OnCancel, OnError,
    error::{DispatchError, TaskError},
    events::Channel,
};

/// State shared by a [`ControlHandle`] and the loop's background actor.
pub(crate) struct LoopState {
    pub(crate) task: Cow<'static, str>,
    running: AtomicBool,
    pub(crate) oncancel: Channel<()>,
    pub(crate) onerror: Channel<TaskError>,
}

impl LoopState {
    pub(crate) fn new(task: impl Into<Cow<'static, str>>) -> Self {
        Self {
            task: task.into(),
            running: AtomicBool::new(true),
            oncancel: Channel::new(),
            onerror: Channel::new(),
        }
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Flips the running flag; returns `true` only for the call that flipped it.
    #[inline]
    pub(crate) fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}

/// Handle to a running forever loop.
///
/// Cheap to clone; every clone controls the same loop. Dropping all handles does
/// **not** stop the loop.
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use forever::{forever, TaskFn, TaskError};
///
/// let handle = forever(
///     TaskFn::arc("flaky", |_oncancel, _: ()| async { Err(TaskError::fail("boom")) }),
///     (),
/// );
/// handle.onerror().subscribe_fn("print", |err| async move {
///     eprintln!("{err}");
///     Ok(())
/// });
///
/// handle.cancel().await.unwrap();
/// assert!(!handle.is_running());
/// # }
/// ```
#[derive(Clone)]
pub struct ControlHandle {
    state: Arc<LoopState>,
}

impl ControlHandle {
    pub(crate) fn new(state: Arc<LoopState>) -> Self {
        Self { state }
    }

    /// Subscribe-only view of the cancellation notifier.
    ///
    /// The same notifier is passed to every task invocation. Once the
    /// cancellation broadcast has started, [`Notifier::is_closed`](crate::Notifier::is_closed)
    /// returns `true`.
    pub fn oncancel(&self) -> &OnCancel {
        self.state.oncancel.notifier()
    }

    /// Subscribe-only view of the error channel.
    ///
    /// Each failed task invocation is dispatched exactly once. With no listener
    /// subscribed at that moment, the error is dropped.
    pub fn onerror(&self) -> &OnError {
        self.state.onerror.notifier()
    }

    /// Returns `false` once the loop has been cancelled, stopped by policy, or
    /// unwound by a task panic (`catch_panics = false`).
    ///
    /// An invocation that was in flight at that moment may still be running.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Requests cancellation.
    ///
    /// The running flag is flipped **synchronously, by this call**: no new task
    /// invocation starts afterwards, even if the returned future is never
    /// awaited. The future then broadcasts on [`oncancel`](Self::oncancel) once.
    ///
    /// Returns `Ok(())` immediately, without broadcasting, on every call after
    /// the first. Otherwise resolves to the outcome of the broadcast: every
    /// listener runs, and all failures are reported in one [`DispatchError`].
    ///
    /// An in-flight invocation is never aborted; it is up to the task to observe
    /// `oncancel` and return.
    pub fn cancel(&self) -> impl Future<Output = Result<(), DispatchError>> + Send + 'static {
        let first = self.state.stop();
        let state = Arc::clone(&self.state);
        async move {
            if !first {
                return Ok(());
            }
            debug!(task = %state.task, "cancellation requested");
            state.oncancel.close(&()).await
        }
    }
}

impl fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHandle")
            .field("task", &self.state.task)
            .field("running", &self.state.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;
    use std::sync::atomic::AtomicUsize;

    fn handle() -> ControlHandle {
        ControlHandle::new(Arc::new(LoopState::new("test")))
    }

    #[tokio::test]
    async fn flag_flips_on_call_not_on_poll() {
        let h = handle();
        let fut = h.cancel();
        assert!(!h.is_running());
        fut.await.unwrap();
    }

    #[tokio::test]
    async fn second_cancel_does_not_rebroadcast() {
        let h = handle();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        h.oncancel().subscribe_fn("count", move |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        h.cancel().await.unwrap();
        h.cancel().await.unwrap();
        h.clone().cancel().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_broadcast_keeps_flag_down() {
        let h = handle();
        h.oncancel()
            .subscribe_fn("bad", |_| async { Err(ListenerError::fail("nope")) });

        let err = h.cancel().await.unwrap_err();
        assert_eq!(err.first().listener, "bad");
        assert!(!h.is_running());
        assert!(h.cancel().await.is_ok());
    }

    #[tokio::test]
    async fn cancel_closes_oncancel() {
        let h = handle();
        assert!(!h.oncancel().is_closed());

        h.cancel().await.unwrap();
        assert!(h.oncancel().is_closed());
        assert!(!h.onerror().is_closed());
    }

    #[test]
    fn debug_shows_task_and_state() {
        let h = handle();
        let s = format!("{h:?}");
        assert!(s.contains("\"test\""));
        assert!(s.contains("running: true"));
    }
}
