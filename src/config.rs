//! Startup configuration, fixed for the lifetime of the process

use crate::args::Args;
use crate::ec::EcTiming;
use crate::errors::{EcFanError, Result};
use crate::fan::HysteresisPolicy;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_LOG_PATH: &str = "/var/log/ecfand.log";

/// Highest meaningful fan register value
pub const MAX_FAN_SPEED: u8 = 0x1f;

/// Everything the daemon needs to know at startup
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
    pub speed: u8,
    pub logging: bool,
    pub daemonize: bool,
    pub port_path: PathBuf,
    pub log_path: PathBuf,
    pub policy: HysteresisPolicy,
    pub ec_timing: EcTiming,
}

impl PollingConfig {
    /// Validate parsed arguments and build the configuration
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.interval == 0 {
            return Err(EcFanError::Config(
                "Polling interval must be at least one second".to_string(),
            ));
        }
        if args.speed > MAX_FAN_SPEED {
            return Err(EcFanError::Config(format!(
                "Fan speed {} is out of range 0-{}",
                args.speed, MAX_FAN_SPEED
            )));
        }
        if args.speed == MAX_FAN_SPEED {
            warn!(
                "Fan speed {} is the fan-off code; the fan will never spin",
                args.speed
            );
        }

        let policy = HysteresisPolicy::with_start_temp(args.start_temp)?;

        if args.daemonize {
            info!("daemonize");
        }
        info!("interval {:02}", args.interval);
        info!("speed {:02}", args.speed);

        Ok(Self {
            interval: Duration::from_secs(args.interval),
            speed: args.speed,
            logging: args.log,
            daemonize: args.daemonize,
            port_path: args.port.clone(),
            log_path: args.log_file.clone(),
            policy,
            ec_timing: EcTiming::default(),
        })
    }

    /// Whether output may go to the terminal
    pub fn console(&self) -> bool {
        !self.daemonize
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            speed: crate::fan_control::DEFAULT_FAN_SPEED,
            logging: false,
            daemonize: false,
            port_path: PathBuf::from(crate::port::DEFAULT_PORT_DEVICE),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            policy: HysteresisPolicy::new(),
            ec_timing: EcTiming::default(),
        }
    }
}
