//! # Listener contract and function-backed listener.
//!
//! [`Listener`] is the extension point for reacting to broadcasts on a
//! [`Notifier`](crate::Notifier). [`ListenerFn`] wraps a closure
//! `F: Fn(A) -> Fut`, producing a fresh future per notification.
//!
//! ## Contract
//! - Listeners are awaited **one after another**, in subscription order, so they
//!   should be fast reactions (flip a flag, dispose a resource, forward a message).
//! - Returning `Err` (or panicking) does not stop the broadcast; later listeners
//!   still run and the failure is collected into a
//!   [`DispatchError`](crate::DispatchError).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use forever::{Listener, ListenerError, TaskError};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Listener<TaskError> for Audit {
//!     async fn on_event(&self, err: &TaskError) -> Result<(), ListenerError> {
//!         // write audit record...
//!         let _ = err.as_label();
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;

/// Contract for broadcast listeners.
///
/// Called from whichever context dispatches the broadcast: the loop's background
/// task for errors, the caller of `cancel()` for cancellation.
#[async_trait]
pub trait Listener<A>: Send + Sync + 'static {
    /// Handles a single broadcast.
    async fn on_event(&self, event: &A) -> Result<(), ListenerError>;

    /// Human-readable name (for logs and [`ListenerFailure`](crate::ListenerFailure)).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Function-backed listener implementation.
///
/// The closure receives an owned clone of the broadcast payload, so the future it
/// returns can be `'static`.
pub struct ListenerFn<A, F> {
    name: Cow<'static, str>,
    f: F,
    _arg: PhantomData<fn(A)>,
}

impl<A, F> ListenerFn<A, F> {
    /// Creates a new function-backed listener.
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<(), ListenerError>>,
    {
        Self {
            name: name.into(),
            f,
            _arg: PhantomData,
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<(), ListenerError>>,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<A, F> fmt::Debug for ListenerFn<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<A, F, Fut> Listener<A> for ListenerFn<A, F>
where
    A: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    async fn on_event(&self, event: &A) -> Result<(), ListenerError> {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn listener_fn_forwards_payload() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let l = ListenerFn::new("adder", move |n: usize| {
            let s = Arc::clone(&s);
            async move {
                s.fetch_add(n, Ordering::SeqCst);
                Ok(())
            }
        });

        assert_eq!(Listener::<usize>::name(&l), "adder");
        l.on_event(&3).await.unwrap();
        l.on_event(&4).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn listener_fn_propagates_error() {
        let l = ListenerFn::new("bad", |_: ()| async { Err(ListenerError::fail("nope")) });
        assert_eq!(l.on_event(&()).await, Err(ListenerError::fail("nope")));
    }

    #[test]
    fn default_name_is_type_name() {
        struct Quiet;

        #[async_trait]
        impl Listener<()> for Quiet {
            async fn on_event(&self, _: &()) -> Result<(), ListenerError> {
                Ok(())
            }
        }

        assert!(Quiet.name().ends_with("Quiet"));
    }
}
