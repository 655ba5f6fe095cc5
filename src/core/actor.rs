//! # LoopActor: the background execution cycle.
//!
//! Invokes one [`Task`] back-to-back until the running flag drops.
//!
//! ## Architecture
//! ```text
//! forever(task, args) ──► tokio::spawn(LoopActor::run())   (JoinHandle dropped)
//!
//! while running {
//!   ├─► run_once(task, oncancel, args.clone())
//!   │       │
//!   │       ├─ Ok  ──► (nothing)
//!   │       └─ Err ──► onerror.dispatch(&err)
//!   │                    ├─ Ok  ──► (nothing)
//!   │                    └─ Err ──► warn!, then DispatchFailurePolicy
//!   │                                 ├─ Continue → go on
//!   │                                 └─ Stop     → flip flag, exit
//!   └─► yield_now()
//! }
//! ```
//!
//! ## Rules
//! - Invocations run **sequentially** (never concurrent for one loop).
//! - The flag is checked only at **iteration boundaries**; cancellation never
//!   aborts an in-flight invocation.
//! - No delay between invocations: waiting is the task's business.
//! - A cooperative yield follows every invocation, so a task that completes
//!   without suspending cannot starve other work on a current-thread runtime.
//! - The cycle exits silently; there is no final event.
//! - With `catch_panics = false` a task panic still unwinds the background
//!   task, but the running flag is dropped and a warning logged first.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, trace, warn};

use crate::{
    core::{config::Config, handle::LoopState, runner::run_once},
    error::panic_info,
    policies::DispatchFailurePolicy,
    tasks::Task,
};

/// Drives one forever loop.
pub(crate) struct LoopActor<A> {
    task: Arc<dyn Task<A>>,
    args: A,
    state: Arc<LoopState>,
    cfg: Config,
}

impl<A> LoopActor<A>
where
    A: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        task: Arc<dyn Task<A>>,
        args: A,
        state: Arc<LoopState>,
        cfg: Config,
    ) -> Self {
        Self {
            task,
            args,
            state,
            cfg,
        }
    }

    /// Runs until the running flag is observed false at an iteration boundary.
    pub(crate) async fn run(self) {
        let mut iteration: u64 = 0;

        while self.state.is_running() {
            iteration += 1;
            let invocation = run_once(
                self.task.as_ref(),
                self.state.oncancel.notifier().clone(),
                self.args.clone(),
                self.cfg.catch_panics,
            );
            let res = if self.cfg.catch_panics {
                invocation.await
            } else {
                match AssertUnwindSafe(invocation).catch_unwind().await {
                    Ok(res) => res,
                    Err(panic) => {
                        self.state.stop();
                        warn!(
                            task = %self.state.task,
                            iteration,
                            panic = %panic_info(panic.as_ref()),
                            "task panicked, loop is unwinding"
                        );
                        std::panic::resume_unwind(panic);
                    }
                }
            };

            if let Err(err) = res {
                debug!(
                    task = %self.state.task,
                    iteration,
                    label = err.as_label(),
                    error = %err,
                    "task invocation failed"
                );

                if let Err(dispatch_err) = self.state.onerror.dispatch(&err).await {
                    warn!(
                        task = %self.state.task,
                        iteration,
                        failed_listeners = dispatch_err.len(),
                        error = %dispatch_err,
                        "error listener failed"
                    );
                    if !self.cfg.survives_dispatch_failure() {
                        self.stop_by_policy(iteration);
                        break;
                    }
                }
            }

            tokio::task::yield_now().await;
        }

        trace!(task = %self.state.task, iterations = iteration, "loop exited");
    }

    fn stop_by_policy(&self, iteration: u64) {
        if self.state.stop() {
            warn!(
                task = %self.state.task,
                iteration,
                policy = ?DispatchFailurePolicy::Stop,
                "stopping loop after failed error dispatch"
            );
        }
    }
}
