//! # Error-dispatch failure policy.
//!
//! [`DispatchFailurePolicy`] decides what the loop does when an
//! [`OnError`](crate::OnError) listener fails (returns `Err` or panics) while
//! being told about a task failure.
//!
//! - [`DispatchFailurePolicy::Continue`] log the failure and keep looping (default).
//! - [`DispatchFailurePolicy::Stop`] log the failure and end the loop.
//!
//! Either way the failure is reported through `tracing` at `warn` level; it
//! never escapes the background task.
//!
//! ## Choosing the right policy
//! ```text
//! DispatchFailurePolicy::Continue  → error reporting is best-effort
//! DispatchFailurePolicy::Stop      → an unobservable failure must halt the work
//! ```

/// Policy controlling the loop after an error listener fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchFailurePolicy {
    /// Log and keep invoking the task (default).
    #[default]
    Continue,
    /// Log, flip the running flag and exit after the current iteration.
    ///
    /// This does **not** broadcast on [`OnCancel`](crate::OnCancel); a later
    /// `cancel()` resolves immediately because the loop is already stopped.
    Stop,
}

impl DispatchFailurePolicy {
    /// Returns `true` if the loop keeps running after a failed error dispatch.
    #[inline]
    pub fn keeps_running(self) -> bool {
        matches!(self, DispatchFailurePolicy::Continue)
    }
}
