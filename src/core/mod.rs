//! Runtime core: the supervisor loop and its control handle.
//!
//! The public API from this module is [`Forever`], [`ControlHandle`] and
//! [`Config`].
//!
//! Internal modules:
//! - [`runner`]: executes one invocation with panic isolation;
//! - [`actor`]: the background cycle re-invoking the task until cancelled;
//! - [`handle`]: shared loop state and the caller-facing handle;
//! - [`builder`]: wiring of state, actor and handle.

mod actor;
mod builder;
mod config;
mod handle;
mod runner;

pub use builder::{Forever, forever};
pub use config::Config;
pub use handle::ControlHandle;
