//! # LogWriter — tracing-backed listener
//!
//! A minimal listener that writes loop broadcasts through `tracing`.
//! Subscribe it to `onerror`, `oncancel`, or both.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! ERROR forever::listeners::log: task failed label="task_failed" error=execution failed: connection refused
//! INFO  forever::listeners::log: cancellation requested
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{ListenerError, TaskError};
use crate::events::{Listener, OnCancel, OnError, SubscriptionId};

/// Tracing writer listener.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Subscribes one writer to both channels of a loop.
    pub fn attach(oncancel: &OnCancel, onerror: &OnError) -> (SubscriptionId, SubscriptionId) {
        let w = Arc::new(Self);
        (oncancel.subscribe(w.clone()), onerror.subscribe(w))
    }
}

#[async_trait]
impl Listener<TaskError> for LogWriter {
    async fn on_event(&self, e: &TaskError) -> Result<(), ListenerError> {
        error!(label = e.as_label(), error = %e, "task failed");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}

#[async_trait]
impl Listener<()> for LogWriter {
    async fn on_event(&self, _: &()) -> Result<(), ListenerError> {
        info!("cancellation requested");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}
