//! Broadcast channels: listeners, notifiers and dispatch.
//!
//! A forever loop owns two independent channels:
//! - **cancellation** ([`OnCancel`], no payload) dispatched once by `cancel()`;
//! - **errors** ([`OnError`], one [`TaskError`] per failed invocation)
//!   dispatched by the loop's background task.
//!
//! ## Contents
//! - [`Listener`], [`ListenerFn`] the subscriber contract and closure adapter
//! - [`Notifier`] subscribe-only view handed to callers and tasks
//! - [`SubscriptionId`] handle for `unsubscribe`
//! - `Channel` (crate-private) the dispatching side

mod channel;
mod listener;

pub(crate) use channel::Channel;
pub use channel::{Notifier, SubscriptionId};
pub use listener::{Listener, ListenerFn};

use crate::error::TaskError;

/// Cancellation notifier: fires once, when the loop is first cancelled.
pub type OnCancel = Notifier<()>;

/// Error channel: fires once per failed task invocation.
pub type OnError = Notifier<TaskError>;
