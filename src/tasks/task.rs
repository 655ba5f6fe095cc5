//! # Repeatable, cooperatively cancelable unit.
//!
//! The [`Task`] trait is what the loop invokes again and again. Each invocation
//! receives the loop's [`OnCancel`] notifier and a clone of the fixed arguments,
//! and returns a boxed `'static` future.
//!
//! A task that needs to stop promptly when the loop is cancelled subscribes to
//! `oncancel` (usually with `subscribe_once`) and makes its own future return.
//!
//! On a multi-thread runtime `cancel()` may broadcast between the loop's flag
//! check and the task's own `subscribe_once`. Such a listener is never invoked,
//! so the task checks [`OnCancel::is_closed`](crate::Notifier::is_closed) right
//! after subscribing and returns if it is already `true`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{OnCancel, error::TaskError};

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task taking arguments of type `A`.
pub type TaskRef<A> = Arc<dyn Task<A>>;

/// # Asynchronous, repeatable unit of work.
///
/// From the loop's perspective a task is stateless between invocations; state
/// that must survive an invocation lives in the task itself or in `args`
/// (e.g. behind an `Arc`).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use forever::{BoxTaskFuture, OnCancel, Task};
///
/// struct Ticker {
///     ticks: Arc<AtomicU64>,
/// }
///
/// impl Task<()> for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     fn spawn(&self, _oncancel: OnCancel, _args: ()) -> BoxTaskFuture {
///         let ticks = Arc::clone(&self.ticks);
///         Box::pin(async move {
///             ticks.fetch_add(1, Ordering::Relaxed);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task<A>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name (used in diagnostics).
    fn name(&self) -> &str;

    /// Creates the future for one invocation.
    fn spawn(&self, oncancel: OnCancel, args: A) -> BoxTaskFuture;
}
