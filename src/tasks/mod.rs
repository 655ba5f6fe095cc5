//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for a repeatable, cooperatively cancelable async unit
//! - [`TaskFn`] - function-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task<A>>`)

mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
