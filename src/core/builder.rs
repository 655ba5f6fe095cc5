use std::sync::Arc;

use crate::{
    core::{Config, actor::LoopActor, handle::ControlHandle, handle::LoopState},
    tasks::TaskRef,
};

/// Builder for starting forever loops with a non-default [`Config`].
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use forever::{Config, DispatchFailurePolicy, Forever, TaskFn};
///
/// let cfg = Config {
///     on_dispatch_failure: DispatchFailurePolicy::Stop,
///     ..Config::default()
/// };
///
/// let handle = Forever::new(cfg).start(
///     TaskFn::arc("noop", |_oncancel, _: ()| async { Ok(()) }),
///     (),
/// );
/// handle.cancel().await.unwrap();
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Forever {
    cfg: Config,
}

impl Forever {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Starts the loop and returns its [`ControlHandle`] immediately.
    ///
    /// Creates a fresh cancellation notifier, error channel and running flag,
    /// then spawns the background cycle on the current tokio runtime. No task
    /// invocation has completed (or necessarily started) when this returns.
    ///
    /// `args` is cloned for every invocation; wrap shared state in an `Arc`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime (as `tokio::spawn` does).
    pub fn start<A>(&self, task: TaskRef<A>, args: A) -> ControlHandle
    where
        A: Clone + Send + Sync + 'static,
    {
        let state = Arc::new(LoopState::new(task.name().to_string()));
        let actor = LoopActor::new(task, args, Arc::clone(&state), self.cfg.clone());

        // Detached: the cycle's lifetime is governed by the running flag.
        drop(tokio::spawn(actor.run()));

        ControlHandle::new(state)
    }
}

/// Runs `task` forever, until cancelled through the returned handle.
///
/// Shorthand for `Forever::default().start(task, args)`.
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use forever::{forever, TaskFn};
///
/// let runs = Arc::new(AtomicU64::new(0));
/// let handle = forever(
///     TaskFn::arc("tick", |_oncancel, runs: Arc<AtomicU64>| async move {
///         runs.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }),
///     Arc::clone(&runs),
/// );
///
/// while runs.load(Ordering::Relaxed) < 3 {
///     tokio::task::yield_now().await;
/// }
/// handle.cancel().await.unwrap();
/// # }
/// ```
pub fn forever<A>(task: TaskRef<A>, args: A) -> ControlHandle
where
    A: Clone + Send + Sync + 'static,
{
    Forever::default().start(task, args)
}
