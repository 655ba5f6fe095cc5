//! Loop policies.
//!
//! This module groups the knobs that control how the loop reacts to failures
//! outside the task itself.
//!
//! ## Contents
//! - [`DispatchFailurePolicy`] what to do when an error listener fails
//!
//! ## Quick wiring
//! ```text
//! Config { on_dispatch_failure: DispatchFailurePolicy, .. }
//!      └─► core::actor::LoopActor uses it after a failed OnError dispatch
//! ```
//!
//! Retry delays and backoff are deliberately absent: a task that wants to wait
//! between runs awaits inside its own future before returning.

mod dispatch;

pub use dispatch::DispatchFailurePolicy;
