//! Test helpers: a simulated embedded controller behind the `PortIo` trait

use crate::ec::{
    Register, EC_CMD_WRITE, EC_COMMAND_PORT, EC_DATA_PORT, EC_STATUS_IBF, EC_STATUS_OBF,
};
use crate::errors::{EcFanError, Result};
use crate::port::PortIo;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

/// In-memory EC that records every port access.
///
/// The status register reports "ready both ways" until `stuck_after` status
/// reads have happened, then reports "busy, nothing to read" forever.
/// Data reads pop queued temperatures and repeat the last one when the
/// queue runs dry.
#[derive(Debug)]
pub struct SimulatedEc {
    pub writes: Vec<(u16, u8)>,
    pub status_reads: usize,
    pub data_reads: usize,
    temperatures: VecDeque<u8>,
    last_temperature: u8,
    stuck_after: Option<usize>,
    closed: Rc<Cell<bool>>,
}

impl SimulatedEc {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            status_reads: 0,
            data_reads: 0,
            temperatures: VecDeque::new(),
            last_temperature: 0,
            stuck_after: None,
            closed: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_temperatures(temps: &[u8]) -> Self {
        let mut ec = Self::new();
        ec.temperatures.extend(temps.iter().copied());
        ec
    }

    /// Status register never reports ready
    pub fn never_ready() -> Self {
        Self::stuck_after(0)
    }

    /// Status register goes busy after `reads` ready reports
    pub fn stuck_after(reads: usize) -> Self {
        Self::new().stuck_from(reads)
    }

    pub fn stuck_from(mut self, reads: usize) -> Self {
        self.stuck_after = Some(reads);
        self
    }

    /// Shared view of the closed flag that outlives the port itself
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.closed)
    }

    /// Speeds written to the fan register by complete write transactions
    pub fn fan_writes(&self) -> Vec<u8> {
        self.writes
            .windows(3)
            .filter_map(|w| match w {
                [(EC_COMMAND_PORT, EC_CMD_WRITE), (EC_DATA_PORT, reg), (EC_DATA_PORT, speed)]
                    if *reg == Register::Fan.id() =>
                {
                    Some(*speed)
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for SimulatedEc {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for SimulatedEc {
    fn read_byte(&mut self, addr: u16) -> Result<u8> {
        if self.closed.get() {
            return Err(EcFanError::PortClosed);
        }
        match addr {
            EC_COMMAND_PORT => {
                let stuck = self
                    .stuck_after
                    .is_some_and(|limit| self.status_reads >= limit);
                self.status_reads += 1;
                Ok(if stuck { EC_STATUS_IBF } else { EC_STATUS_OBF })
            }
            EC_DATA_PORT => {
                self.data_reads += 1;
                if let Some(temp) = self.temperatures.pop_front() {
                    self.last_temperature = temp;
                }
                Ok(self.last_temperature)
            }
            _ => Ok(0xff),
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<()> {
        if self.closed.get() {
            return Err(EcFanError::PortClosed);
        }
        self.writes.push((addr, value));
        Ok(())
    }

    fn close(&mut self) {
        self.closed.set(true);
    }

    fn is_open(&self) -> bool {
        !self.closed.get()
    }
}
