//! # Observability
//!
//! The library only emits `tracing` events and spans:
//!
//! - `debug!` per pipeline stage, with sizes and parameters
//! - `warn!` when the Butterworth path falls back to the moving average
//! - one span per [`Pipeline::run`](crate::pipeline::Pipeline::run)
//!
//! Binaries decide where those go by calling [`init_logging`].

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
