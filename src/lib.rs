//! Embedded-controller fan daemon
//!
//! Reads the EC temperature register through `/dev/port` and switches the
//! fan on and off with a two-threshold hysteresis.

pub mod args;
pub mod config;
pub mod daemon;
pub mod ec;
pub mod errors;
pub mod fan;
pub mod fan_control;
pub mod logging;
pub mod port;
pub mod shutdown;
pub mod status_log;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use errors::{EcFanError, Result};
pub use fan::{FanState, HysteresisPolicy};
