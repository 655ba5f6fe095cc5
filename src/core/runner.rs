//! # Run a single invocation of a task.
//!
//! - **Execute ONE invocation** with the loop's `oncancel` and a clone of the args
//! - **Isolate panics** when configured (`catch_unwind` around the task future)
//!
//! ## Outcomes
//! ```text
//! task.spawn() → Ok(())   → Ok(())
//! task.spawn() → Err(e)   → Err(e)
//! task.spawn() → panic    → Err(TaskError::Panicked)   (catch_panics = true)
//!                         → unwinds                    (catch_panics = false)
//! ```

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    OnCancel,
    error::{TaskError, panic_info},
    tasks::Task,
};

/// Executes a single invocation of `task`.
///
/// A panic while *creating* the future (inside `spawn`) is caught as well.
pub async fn run_once<A, T: Task<A> + ?Sized>(
    task: &T,
    oncancel: OnCancel,
    args: A,
    catch_panics: bool,
) -> Result<(), TaskError> {
    if !catch_panics {
        return task.spawn(oncancel, args).await;
    }

    let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| task.spawn(oncancel, args))) {
        Ok(fut) => fut,
        Err(panic) => {
            return Err(TaskError::Panicked {
                info: panic_info(panic.as_ref()),
            });
        }
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::Panicked {
            info: panic_info(panic.as_ref()),
        }),
    }
}
