//! Embedded controller handshake over the ACPI EC ports.
//!
//! Every register access is a short transaction: wait until the controller
//! accepts input, send a command byte on the command port, wait again, send
//! the register id on the data port, then either wait for output and read
//! the result or wait for input space and write the payload. A transaction
//! stops at the first wait that times out; nothing after it reaches the
//! hardware.

use crate::errors::EcFanError;
use crate::port::PortIo;
use crate::shutdown::ShutdownSignal;
use log::trace;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Data register port
pub const EC_DATA_PORT: u16 = 0x62;
/// Command (write) and status (read) register port
pub const EC_COMMAND_PORT: u16 = 0x66;

/// Status bit: output buffer full, a byte is waiting on the data port
pub const EC_STATUS_OBF: u8 = 0x01;
/// Status bit: input buffer full, the controller has not consumed our last byte
pub const EC_STATUS_IBF: u8 = 0x02;

/// Command byte: read an EC register
pub const EC_CMD_READ: u8 = 0x80;
/// Command byte: write an EC register
pub const EC_CMD_WRITE: u8 = 0x81;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const DEFAULT_MAX_POLLS: u32 = 10_000;

/// EC registers used by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Temperature = 0x58,
    Fan = 0x55,
}

impl Register {
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// What the caller is about to do on the data port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ForRead,
    ForWrite,
}

impl Direction {
    fn is_ready(self, status: u8) -> bool {
        match self {
            Direction::ForRead => status & EC_STATUS_OBF != 0,
            Direction::ForWrite => status & EC_STATUS_IBF == 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ForRead => write!(f, "for read"),
            Direction::ForWrite => write!(f, "for write"),
        }
    }
}

/// Failure of a single EC transaction
#[derive(Error, Debug)]
pub enum EcError {
    #[error("EC not ready {direction} after {polls} polls")]
    Timeout { direction: Direction, polls: u32 },

    #[error("EC transaction cancelled by shutdown")]
    Cancelled,

    #[error("Port access failed: {0}")]
    Port(#[from] EcFanError),
}

/// Status polling limits for `wait_ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcTiming {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for EcTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

/// EC protocol driver on top of a port channel
pub struct EmbeddedController<P: PortIo> {
    port: P,
    timing: EcTiming,
    shutdown: ShutdownSignal,
}

impl<P: PortIo> EmbeddedController<P> {
    pub fn new(port: P, timing: EcTiming, shutdown: ShutdownSignal) -> Self {
        Self {
            port,
            timing,
            shutdown,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Release the port channel. Safe to call more than once.
    pub fn close(&mut self) {
        self.port.close();
    }

    /// Poll the status register until the controller is ready in `direction`.
    ///
    /// Reads the status register at most `max_polls` times, sleeping
    /// `poll_interval` between unready reads. The shutdown flag is checked
    /// before every poll.
    pub async fn wait_ready(&mut self, direction: Direction) -> Result<(), EcError> {
        for poll in 0..self.timing.max_polls {
            if self.shutdown.is_triggered() {
                return Err(EcError::Cancelled);
            }

            let status = self.port.read_byte(EC_COMMAND_PORT)?;
            if direction.is_ready(status) {
                if poll > 0 {
                    trace!("EC ready {} after {} polls", direction, poll);
                }
                return Ok(());
            }

            if poll + 1 < self.timing.max_polls {
                sleep(self.timing.poll_interval).await;
            }
        }

        Err(EcError::Timeout {
            direction,
            polls: self.timing.max_polls,
        })
    }

    /// Read the EC temperature register, degrees Celsius
    pub async fn read_temperature(&mut self) -> Result<u8, EcError> {
        self.read_register(Register::Temperature).await
    }

    /// Write `speed` to the EC fan register
    pub async fn write_fan_register(&mut self, speed: u8) -> Result<(), EcError> {
        self.write_register(Register::Fan, speed).await
    }

    async fn read_register(&mut self, register: Register) -> Result<u8, EcError> {
        self.wait_ready(Direction::ForWrite).await?;
        self.port.write_byte(EC_COMMAND_PORT, EC_CMD_READ)?;
        self.wait_ready(Direction::ForWrite).await?;
        self.port.write_byte(EC_DATA_PORT, register.id())?;
        self.wait_ready(Direction::ForRead).await?;
        let value = self.port.read_byte(EC_DATA_PORT)?;
        trace!("EC read {:?} = {:#04x}", register, value);
        Ok(value)
    }

    async fn write_register(&mut self, register: Register, value: u8) -> Result<(), EcError> {
        self.wait_ready(Direction::ForWrite).await?;
        self.port.write_byte(EC_COMMAND_PORT, EC_CMD_WRITE)?;
        self.wait_ready(Direction::ForWrite).await?;
        self.port.write_byte(EC_DATA_PORT, register.id())?;
        self.wait_ready(Direction::ForWrite).await?;
        self.port.write_byte(EC_DATA_PORT, value)?;
        trace!("EC write {:?} <- {:#04x}", register, value);
        Ok(())
    }
}
