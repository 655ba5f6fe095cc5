//! # Ordered broadcast channel.
//!
//! [`Channel`] is an explicit observer list: an ordered sequence of listeners
//! with `subscribe` / `subscribe_once` / `unsubscribe`, and a `dispatch` that
//! invokes every listener. [`Notifier`] is the subscribe-only view handed out to
//! callers; only the owner of the `Channel` can dispatch.
//!
//! ## Architecture
//! ```text
//! dispatch(&event)
//!     │  (lock) snapshot listeners, drop one-shot slots, (unlock)
//!     │
//!     ├──► listener 1.on_event(&event) ──► Ok / Err / panic ─┐
//!     ├──► listener 2.on_event(&event) ──► Ok / Err / panic ─┤ collected
//!     └──► listener N.on_event(&event) ──► Ok / Err / panic ─┘
//!                                                            ▼
//!                                     Ok(()) or DispatchError { failures }
//! ```
//!
//! ## Rules
//! - **Subscription order**: listeners run sequentially, oldest first.
//! - **Fan-out, not short-circuit**: a failing or panicking listener never
//!   prevents later listeners from running.
//! - **Aggregate errors**: every failure is kept; `DispatchError::first` is the
//!   first one observed.
//! - **One-shot**: a `subscribe_once` slot is removed under the lock when a
//!   dispatch snapshots it, so it fires at most once even under concurrent
//!   dispatches.
//! - **Fire-and-forget**: with no listeners, dispatch is a no-op returning `Ok(())`.
//! - **Re-entrancy**: the lock is never held across `.await`; listeners may
//!   subscribe or unsubscribe from inside `on_event`. Changes apply from the next
//!   dispatch.
//! - **Closing**: a final broadcast marks the channel closed under the same lock
//!   that takes its snapshot. A listener added afterwards is never invoked, so a
//!   subscriber checks [`Notifier::is_closed`] right after subscribing.
//!
//! ## Panic handling
//! Each listener future is driven through `catch_unwind`; a panic is converted
//! into [`ListenerError::Panicked`].
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a listener panics while holding a lock.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;

use crate::error::{DispatchError, ListenerError, ListenerFailure, panic_info};
use crate::events::listener::{Listener, ListenerFn};

/// Global counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle identifying one subscription, used to [`unsubscribe`](Notifier::unsubscribe).
///
/// Ids are unique across every notifier in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }
}

struct Slot<A> {
    id: SubscriptionId,
    once: bool,
    listener: Arc<dyn Listener<A>>,
}

struct Inner<A> {
    slots: Mutex<Vec<Slot<A>>>,
    closed: AtomicBool,
}

/// Subscribe-only view of a broadcast channel.
///
/// Cheap to clone; all clones observe the same listener list.
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use forever::{forever, TaskFn};
///
/// let handle = forever(
///     TaskFn::arc("idle", |_oncancel, _: ()| async { Ok(()) }),
///     (),
/// );
///
/// let id = handle.oncancel().subscribe_fn("on-cancel", |_| async { Ok(()) });
/// assert_eq!(handle.oncancel().listener_count(), 1);
/// assert!(handle.oncancel().unsubscribe(id));
/// assert!(handle.oncancel().is_empty());
/// # handle.cancel().await.unwrap();
/// # }
/// ```
pub struct Notifier<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for Notifier<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.lock().len())
            .finish()
    }
}

impl<A> Notifier<A> {
    fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot<A>>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the id was unknown, already removed, or a one-shot
    /// listener that has already fired.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|s| s.id != id);
        slots.len() != before
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` once the final broadcast has taken its snapshot.
    ///
    /// For [`OnCancel`](crate::OnCancel) this means cancellation has been
    /// broadcast. A listener subscribed before this returns `false` is
    /// guaranteed to be part of that broadcast; one subscribed after it returns
    /// `true` never runs.
    ///
    /// ```rust
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use std::sync::Arc;
    /// use tokio::sync::Notify;
    /// use forever::{forever, OnCancel, TaskFn};
    ///
    /// let task = TaskFn::arc("worker", |oncancel: OnCancel, _: ()| async move {
    ///     let stop = Arc::new(Notify::new());
    ///     let s = Arc::clone(&stop);
    ///     let id = oncancel.subscribe_once_fn("stop", move |_| {
    ///         s.notify_one();
    ///         async { Ok(()) }
    ///     });
    ///     if !oncancel.is_closed() {
    ///         stop.notified().await;
    ///     }
    ///     oncancel.unsubscribe(id);
    ///     Ok(())
    /// });
    ///
    /// let handle = forever(task, ());
    /// tokio::task::yield_now().await;
    /// handle.cancel().await.unwrap();
    /// # }
    /// ```
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl<A> Notifier<A>
where
    A: Send + Sync + 'static,
{
    /// Registers a listener invoked on every broadcast.
    pub fn subscribe(&self, listener: Arc<dyn Listener<A>>) -> SubscriptionId {
        self.push(listener, false)
    }

    /// Registers a listener invoked on the next broadcast only.
    pub fn subscribe_once(&self, listener: Arc<dyn Listener<A>>) -> SubscriptionId {
        self.push(listener, true)
    }

    fn push(&self, listener: Arc<dyn Listener<A>>, once: bool) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.lock().push(Slot { id, once, listener });
        id
    }
}

impl<A> Notifier<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Registers a closure invoked on every broadcast.
    ///
    /// Shorthand for `subscribe(ListenerFn::arc(name, f))`.
    pub fn subscribe_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> SubscriptionId
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.subscribe(ListenerFn::arc(name, f))
    }

    /// Registers a closure invoked on the next broadcast only.
    pub fn subscribe_once_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> SubscriptionId
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.subscribe_once(ListenerFn::arc(name, f))
    }
}

/// Owning side of a broadcast channel: the only place `dispatch` is reachable.
pub(crate) struct Channel<A> {
    notifier: Notifier<A>,
}

impl<A> Channel<A>
where
    A: Send + Sync + 'static,
{
    /// Creates an empty channel.
    pub(crate) fn new() -> Self {
        Self {
            notifier: Notifier::new(),
        }
    }

    /// Subscribe-only view of this channel.
    pub(crate) fn notifier(&self) -> &Notifier<A> {
        &self.notifier
    }

    /// Invokes every listener with `event`, in subscription order.
    ///
    /// All listeners run even if some fail; failures are aggregated.
    pub(crate) async fn dispatch(&self, event: &A) -> Result<(), DispatchError> {
        self.broadcast(event, false).await
    }

    /// Like [`dispatch`](Self::dispatch), but marks the channel closed in the
    /// same critical section that takes the snapshot.
    pub(crate) async fn close(&self, event: &A) -> Result<(), DispatchError> {
        self.broadcast(event, true).await
    }

    async fn broadcast(&self, event: &A, close: bool) -> Result<(), DispatchError> {
        let snapshot: Vec<Arc<dyn Listener<A>>> = {
            let mut slots = self.notifier.lock();
            if close {
                self.notifier.inner.closed.store(true, Ordering::Release);
            }
            let listeners = slots.iter().map(|s| Arc::clone(&s.listener)).collect();
            slots.retain(|s| !s.once);
            listeners
        };

        let mut failures = Vec::new();
        for listener in snapshot {
            let outcome = AssertUnwindSafe(listener.on_event(event))
                .catch_unwind()
                .await;
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic) => ListenerError::Panicked {
                    info: panic_info(panic.as_ref()),
                },
            };
            failures.push(ListenerFailure {
                listener: Cow::Owned(listener.name().to_string()),
                error,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::new(failures))
        }
    }
}
