//! Runtime plumbing for the engine: tracing setup and background workers.

pub mod logging;
pub mod workers;

pub use logging::{LogFormat, init_tracing};
pub use workers::{SessionSweeper, Workers};
