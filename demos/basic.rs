//! # Example: basic
//!
//! Minimal example of a task run forever, then cancelled.
//!
//! Demonstrates how to:
//! - Define a task using [`TaskFn`] with a fixed argument.
//! - Start it with [`forever`] and keep the [`ControlHandle`](forever::ControlHandle).
//! - Cancel it and observe that no new run starts.
//!
//! ## Flow
//! ```text
//! forever(task, counter) ──► tokio::spawn(loop)
//!     ├─► run #1 ─► sleep 100ms ─► Ok
//!     ├─► run #2 ─► sleep 100ms ─► Ok
//!     ├─► ...
//!     └─► handle.cancel() ─► flag down ─► in-flight run finishes ─► loop exits
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use forever::{TaskFn, forever};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Shared state lives in the fixed args; each run gets a clone of the Arc
    let runs = Arc::new(AtomicU32::new(0));

    // 2. Define the task: the pacing is the task's own business
    let tick = TaskFn::arc("tick", |_oncancel, runs: Arc<AtomicU32>| async move {
        let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[tick] run #{n}");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    });

    // 3. Start it; the handle comes back immediately
    let handle = forever(tick, Arc::clone(&runs));

    // 4. Let it run for a bit, then cancel
    tokio::time::sleep(Duration::from_millis(550)).await;
    handle.cancel().await?;
    println!("[main] cancelled after {} runs", runs.load(Ordering::SeqCst));

    // 5. The in-flight run drains; nothing new starts
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("[main] final count {}", runs.load(Ordering::SeqCst));
    Ok(())
}
