//! Logging setup for the `wharf` binary and embedding applications.

pub mod tracing_setup;

pub use tracing_setup::TracingConfig;
