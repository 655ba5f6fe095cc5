//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(OnCancel, A) -> Fut`, producing a fresh
//! future per invocation. No state is hidden between invocations; shared state
//! goes into `A` (or the closure captures) explicitly, typically as `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use forever::{TaskFn, TaskRef};
//!
//! let t: TaskRef<Arc<AtomicU64>> = TaskFn::arc("counter", |_oncancel, n: Arc<AtomicU64>| async move {
//!     n.fetch_add(1, Ordering::Relaxed);
//!     Ok(())
//! });
//!
//! assert_eq!(t.name(), "counter");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::OnCancel;
use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
pub struct TaskFn<A, F> {
    name: Cow<'static, str>,
    f: F,
    _args: PhantomData<fn(A)>,
}

impl<A, F> TaskFn<A, F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(OnCancel, A) -> Fut,
        Fut: Future<Output = Result<(), TaskError>>,
    {
        Self {
            name: name.into(),
            f,
            _args: PhantomData,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(OnCancel, A) -> Fut,
        Fut: Future<Output = Result<(), TaskError>>,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<A, F> fmt::Debug for TaskFn<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<A, F, Fut> Task<A> for TaskFn<A, F>
where
    A: 'static,
    F: Fn(OnCancel, A) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, oncancel: OnCancel, args: A) -> BoxTaskFuture {
        let fut = (self.f)(oncancel, args);
        Box::pin(fut)
    }
}
