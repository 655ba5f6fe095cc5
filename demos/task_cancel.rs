//! # Example: task_cancel
//!
//! Demonstrates cooperative cancellation of a long-running invocation.
//!
//! Shows how to:
//! - Subscribe to `oncancel` from inside the task (one-shot listener)
//! - Wake the in-flight invocation so it returns promptly
//! - Learn when the last invocation has drained, via the task's own signal
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► forever(worker, drained)
//!   │     └─► run: subscribe_once(oncancel) ─► wait for "stop" or 2s timer
//!   │
//!   └─► sleep 500ms
//!         ├─► handle.cancel()
//!         │     ├─► flag down (no new run)
//!         │     └─► oncancel broadcast ─► worker's listener fires "stop"
//!         └─► await drained.notified()  (worker signals after cleanup)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example task_cancel
//! ```

use std::sync::Arc;
use std::time::Duration;

use forever::{OnCancel, TaskFn, forever};
use tokio::sync::Notify;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== task_cancel example ===\n");

    // 1. The task signals this when it has wound down after cancellation
    let drained = Arc::new(Notify::new());

    // 2. A worker that waits on a slow "resource" but listens for cancellation
    let worker = TaskFn::arc(
        "worker",
        |oncancel: OnCancel, drained: Arc<Notify>| async move {
            println!("[worker] waiting on resource");

            let stop = Arc::new(Notify::new());
            let s = Arc::clone(&stop);
            let id = oncancel.subscribe_once_fn("dispose-resource", move |_| {
                s.notify_one();
                async { Ok(()) }
            });

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(2)) => {
                    oncancel.unsubscribe(id);
                    println!("[worker] resource ready");
                }
                _ = stop.notified() => {
                    println!("[worker] cancellation observed, cleaning up");
                    drained.notify_one();
                }
            }
            Ok(())
        },
    );

    // 3. Start the loop
    let handle = forever(worker, Arc::clone(&drained));

    // 4. Cancel while the first invocation is in flight
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("[main] cancelling");
    handle.cancel().await?;

    // 5. Wait for the task's own "drained" signal
    drained.notified().await;
    println!("[main] worker drained, running={}", handle.is_running());
    Ok(())
}
