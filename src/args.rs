//! Command line argument parsing for the fan daemon

use crate::config::{DEFAULT_INTERVAL_SECS, DEFAULT_LOG_PATH, MAX_FAN_SPEED};
use crate::fan::START_TEMP;
use crate::fan_control::DEFAULT_FAN_SPEED;
use crate::port::DEFAULT_PORT_DEVICE;
use clap::Parser;
use std::path::PathBuf;

/// Embedded-controller fan daemon
///
/// Polls the EC temperature register and switches the fan on and off
/// around two thresholds.
#[derive(Parser, Debug)]
#[command(name = "ecfand")]
#[command(about = "Embedded-controller fan daemon")]
#[command(version)]
pub struct Args {
    /// Detach from the controlling terminal and run in the background
    #[arg(short = 'd')]
    pub daemonize: bool,

    /// Polling interval in seconds
    #[arg(
        short = 'i',
        value_name = "SECONDS",
        default_value_t = DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Append a status line to the log file on every tick
    #[arg(short = 'l')]
    pub log: bool,

    /// Fan register value used when starting the fan
    #[arg(
        short = 's',
        value_name = "SPEED",
        default_value_t = DEFAULT_FAN_SPEED,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_FAN_SPEED))
    )]
    pub speed: u8,

    /// Increase diagnostic verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Port device giving access to the I/O port space
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PORT_DEVICE)]
    pub port: PathBuf,

    /// Status log file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_PATH)]
    pub log_file: PathBuf,

    /// Temperature (°C) at which the fan starts; it stops 10°C lower
    #[arg(long, value_name = "CELSIUS", default_value_t = START_TEMP)]
    pub start_temp: u8,
}
