//! # forever
//!
//! **forever** runs an async task again and again, until it is explicitly
//! cancelled, while isolating the caller from the errors each run raises.
//!
//! It is a minimal supervisory loop: no schedules, no backoff, no signal
//! sources. Those belong inside the task.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   forever(task, args)
//!        │  creates
//!        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ LoopState                                                   │
//! │  - running flag (true → false, once)                        │
//! │  - oncancel: Channel<()>          (broadcast, no payload)   │
//! │  - onerror:  Channel<TaskError>   (broadcast, one per fail) │
//! └──────┬───────────────────────────────────────────┬──────────┘
//!        │ shared with                               │ shared with
//!        ▼                                           ▼
//! ┌──────────────┐                          ┌──────────────────┐
//! │ ControlHandle│  returned immediately    │    LoopActor     │ tokio::spawn, detached
//! │  cancel()    │                          │  while running { │
//! │  oncancel()  │                          │    run task      │
//! │  onerror()   │                          │    Err → onerror │
//! └──────────────┘                          │  }               │
//!                                           └──────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ──cancel()──► Cancelling ──broadcast done──► Cancelled
//!   │                      │
//!   │ task runs            │ flag already false: no new invocation;
//!   │ back-to-back         │ the in-flight one finishes on its own
//! ```
//!
//! - `cancel()` flips the flag on the call and broadcasts `oncancel` **once**;
//!   later calls resolve immediately.
//! - A task failure never stops the loop; it goes to every `onerror` listener
//!   (or nowhere, if there are none).
//! - A failing `onerror` listener is logged and, by default, ignored
//!   (see [`DispatchFailurePolicy`]).
//! - Cancellation is cooperative: a task that ignores `oncancel` and never
//!   returns keeps the loop alive.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                        |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Loop**          | Start a task forever, get a handle back.                 | [`forever`], [`Forever`], [`ControlHandle`] |
//! | **Tasks**         | Define tasks as closures or trait impls.                 | [`Task`], [`TaskFn`], [`TaskRef`]         |
//! | **Broadcasts**    | Ordered observer lists with one-shot subscriptions.      | [`Notifier`], [`Listener`], [`ListenerFn`] |
//! | **Policies**      | React to failed error listeners.                         | [`DispatchFailurePolicy`]                 |
//! | **Errors**        | Typed errors for tasks, listeners and broadcasts.        | [`TaskError`], [`ListenerError`], [`DispatchError`] |
//! | **Configuration** | Per-loop settings.                                       | [`Config`]                                |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] listener _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use tokio::sync::Notify;
//! use forever::{forever, OnCancel, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let poller = TaskFn::arc("poller", |oncancel: OnCancel, _: ()| async move {
//!         // Wake up early when the loop is cancelled.
//!         let wake = Arc::new(Notify::new());
//!         let w = Arc::clone(&wake);
//!         let id = oncancel.subscribe_once_fn("wake", move |_| {
//!             w.notify_one();
//!             async { Ok(()) }
//!         });
//!
//!         tokio::select! {
//!             _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!             _ = wake.notified() => {}
//!         }
//!         oncancel.unsubscribe(id);
//!         Err(TaskError::fail("upstream unavailable"))
//!     });
//!
//!     let handle = forever(poller, ());
//!
//!     let seen = Arc::new(AtomicBool::new(false));
//!     let s = Arc::clone(&seen);
//!     handle.onerror().subscribe_fn("report", move |err: TaskError| {
//!         s.store(true, Ordering::SeqCst);
//!         async move {
//!             eprintln!("run failed: {err}");
//!             Ok(())
//!         }
//!     });
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     handle.cancel().await?;
//!     assert!(seen.load(Ordering::SeqCst));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod tasks;

// ---- Public re-exports ----

pub use self::core::{Config, ControlHandle, Forever, forever};
pub use error::{DispatchError, ListenerError, ListenerFailure, TaskError};
pub use events::{Listener, ListenerFn, Notifier, OnCancel, OnError, SubscriptionId};
pub use policies::DispatchFailurePolicy;
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod listeners;
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
