//! Fan state and the on/off hysteresis policy

use crate::errors::{EcFanError, Result};
use std::fmt;

/// Temperature at or above which a stopped fan is started, °C
pub const START_TEMP: u8 = 59;
/// Temperature at or below which a running fan is stopped, °C
pub const STOP_TEMP: u8 = 49;
/// Spread between the start and stop thresholds
pub const DEAD_BAND: u8 = START_TEMP - STOP_TEMP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanState {
    #[default]
    Off,
    On,
}

impl FanState {
    /// Numeric form used in status lines
    pub fn as_u8(self) -> u8 {
        match self {
            FanState::Off => 0,
            FanState::On => 1,
        }
    }
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanState::Off => write!(f, "off"),
            FanState::On => write!(f, "on"),
        }
    }
}

/// What the fan controller has to do for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAction {
    Start,
    Stop,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub next: FanState,
    pub action: FanAction,
}

/// Two-threshold on/off policy.
///
/// Between the thresholds the current state is kept, whichever it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HysteresisPolicy {
    start_temp: u8,
    stop_temp: u8,
}

impl HysteresisPolicy {
    pub fn new() -> Self {
        Self {
            start_temp: START_TEMP,
            stop_temp: STOP_TEMP,
        }
    }

    /// Policy starting at `start_temp`, stopping `DEAD_BAND` degrees lower
    pub fn with_start_temp(start_temp: u8) -> Result<Self> {
        let stop_temp = start_temp.checked_sub(DEAD_BAND).ok_or_else(|| {
            EcFanError::Config(format!(
                "Start temperature {}°C leaves no room for a {}°C dead band",
                start_temp, DEAD_BAND
            ))
        })?;
        Ok(Self {
            start_temp,
            stop_temp,
        })
    }

    pub fn start_temp(&self) -> u8 {
        self.start_temp
    }

    pub fn stop_temp(&self) -> u8 {
        self.stop_temp
    }

    pub fn decide(&self, state: FanState, temperature: u8) -> Decision {
        match state {
            FanState::Off if temperature >= self.start_temp => Decision {
                next: FanState::On,
                action: FanAction::Start,
            },
            FanState::On if temperature <= self.stop_temp => Decision {
                next: FanState::Off,
                action: FanAction::Stop,
            },
            _ => Decision {
                next: state,
                action: FanAction::Hold,
            },
        }
    }
}

impl Default for HysteresisPolicy {
    fn default() -> Self {
        Self::new()
    }
}
