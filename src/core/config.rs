//! # Loop configuration.
//!
//! Provides [`Config`] the settings for a forever loop.
//!
//! Config is used through the builder: `Forever::new(config).start(task, args)`.
//! [`forever`](crate::forever) uses `Config::default()`.

use crate::policies::DispatchFailurePolicy;

/// Configuration for one forever loop.
///
/// ## Field semantics
/// - `on_dispatch_failure`: what to do when an error listener fails
/// - `catch_panics`: convert task panics into [`TaskError::Panicked`](crate::TaskError::Panicked)
///
/// ## Notes
/// All fields are public for flexibility.
#[derive(Clone, Debug)]
pub struct Config {
    /// Reaction to a failed [`OnError`](crate::OnError) dispatch.
    ///
    /// The failure is always logged; this decides whether the loop goes on.
    pub on_dispatch_failure: DispatchFailurePolicy,

    /// Whether a panicking task invocation is caught and reported as an error.
    ///
    /// - `true` = panic becomes `TaskError::Panicked` on `onerror`, loop continues
    /// - `false` = panic unwinds the background task and the loop is gone; the
    ///   running flag drops first, so `is_running()` reports `false` and a later
    ///   `cancel()` resolves without notifying listeners
    pub catch_panics: bool,
}

impl Config {
    /// Returns `true` if the loop survives a failed error dispatch.
    #[inline]
    pub fn survives_dispatch_failure(&self) -> bool {
        self.on_dispatch_failure.keeps_running()
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `on_dispatch_failure = DispatchFailurePolicy::Continue` (log and go on)
    /// - `catch_panics = true`
    fn default() -> Self {
        Self {
            on_dispatch_failure: DispatchFailurePolicy::default(),
            catch_panics: true,
        }
    }
}
