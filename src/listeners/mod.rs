//! Built-in listeners.
//!
//! - [`LogWriter`] writes task failures and cancellation through `tracing`
//!   _(reference/demo)_.

mod log;

pub use log::LogWriter;
