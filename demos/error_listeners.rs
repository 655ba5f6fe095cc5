//! # Example: error_listeners
//!
//! Demonstrates error observation with the built-in [`LogWriter`] and a custom
//! [`Listener`], plus the [`DispatchFailurePolicy`] knob.
//!
//! Requires the `logging` feature.
//!
//! ## Flow
//! ```text
//! flaky task ─► Err("upstream timeout") every 3rd run
//!      └─► onerror.dispatch(&err)
//!            ├─► LogWriter        (tracing ERROR)
//!            └─► FailureCounter   (counts, rejects after 3)
//!                  └─► listener failure ─► warn! ─► Continue (keep looping)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example error_listeners --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use forever::{
    Config, DispatchFailurePolicy, Forever, Listener, ListenerError, LogWriter, TaskError, TaskFn,
};

/// Counts failures and starts rejecting once a threshold is crossed.
struct FailureCounter {
    seen: AtomicU32,
    limit: u32,
}

#[async_trait]
impl Listener<TaskError> for FailureCounter {
    async fn on_event(&self, err: &TaskError) -> Result<(), ListenerError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[counter] failure #{n}: {}", err.as_message());
        if n > self.limit {
            return Err(ListenerError::fail(format!("over limit ({n} > {})", self.limit)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "failure-counter"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(true).init();

    // 1. Keep looping even if a listener breaks (the default, spelled out)
    let cfg = Config {
        on_dispatch_failure: DispatchFailurePolicy::Continue,
        ..Config::default()
    };

    // 2. A task that fails every third run
    let flaky = TaskFn::arc("flaky", |_oncancel, runs: Arc<AtomicU32>| async move {
        let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(50)).await;
        if n % 3 == 0 {
            return Err(TaskError::fail("upstream timeout"));
        }
        Ok(())
    });

    let handle = Forever::new(cfg).start(flaky, Arc::new(AtomicU32::new(0)));

    // 3. Observers
    LogWriter::attach(handle.oncancel(), handle.onerror());
    handle.onerror().subscribe(Arc::new(FailureCounter {
        seen: AtomicU32::new(0),
        limit: 3,
    }));

    // 4. Run for a while, then cancel
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.cancel().await?;
    Ok(())
}
