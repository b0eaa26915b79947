//! Byte-level access to the I/O port address space through `/dev/port`

use crate::errors::{EcFanError, Result};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default port device on Linux
pub const DEFAULT_PORT_DEVICE: &str = "/dev/port";

/// Set while a `DevPort` handle is open anywhere in the process
static PORT_OPEN: AtomicBool = AtomicBool::new(false);

/// Byte-addressed port primitives used by the EC protocol.
///
/// Reading a status or data register may change hardware state, so every
/// call is one observation. Implementations never retry.
pub trait PortIo {
    /// Read one byte at `addr`
    fn read_byte(&mut self, addr: u16) -> Result<u8>;

    /// Write one byte at `addr`
    fn write_byte(&mut self, addr: u16, value: u8) -> Result<()>;

    /// Release the underlying handle. Calling it again is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Exclusive handle on the port device
#[derive(Debug)]
pub struct DevPort {
    path: PathBuf,
    file: Option<File>,
}

impl DevPort {
    /// Open the port device read/write.
    ///
    /// Only one handle may be open per process; a second call fails with
    /// [`EcFanError::PortBusy`] until the first handle is closed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if PORT_OPEN
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EcFanError::PortBusy);
        }

        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => {
                debug!("Opened port device {}", path.display());
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(source) => {
                PORT_OPEN.store(false, Ordering::SeqCst);
                Err(EcFanError::OpenFailed { path, source })
            }
        }
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(EcFanError::PortClosed)
    }
}

impl PortIo for DevPort {
    fn read_byte(&mut self, addr: u16) -> Result<u8> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(u64::from(addr)))?;
        let mut buf = [0u8; 1];
        file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<()> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(u64::from(addr)))?;
        file.write_all(&[value])?;
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            PORT_OPEN.store(false, Ordering::SeqCst);
            debug!("Closed port device {}", self.path.display());
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for DevPort {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    fn fake_port_device() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let mut bytes = [0u8; 0x100];
        bytes[0x66] = 0x01;
        bytes[0x62] = 0x2a;
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_read_and_write_seek_to_address() {
        let device = fake_port_device();
        let mut port = DevPort::open(device.path()).unwrap();

        assert_eq!(port.read_byte(0x66).unwrap(), 0x01);
        assert_eq!(port.read_byte(0x62).unwrap(), 0x2a);

        port.write_byte(0x62, 0x55).unwrap();
        assert_eq!(port.read_byte(0x62).unwrap(), 0x55);
        assert_eq!(port.read_byte(0x66).unwrap(), 0x01);
    }

    #[test]
    #[serial]
    fn test_open_missing_device_fails() {
        let err = DevPort::open("/nonexistent/ecfand/port").unwrap_err();
        assert!(matches!(err, EcFanError::OpenFailed { .. }));

        // A failed open must not leave the guard set
        let device = fake_port_device();
        assert!(DevPort::open(device.path()).is_ok());
    }

    #[test]
    #[serial]
    fn test_second_open_is_refused_until_close() {
        let device = fake_port_device();
        let mut first = DevPort::open(device.path()).unwrap();

        assert!(matches!(
            DevPort::open(device.path()).unwrap_err(),
            EcFanError::PortBusy
        ));

        first.close();
        let second = DevPort::open(device.path());
        assert!(second.is_ok());
    }

    #[test]
    #[serial]
    fn test_close_is_idempotent_and_blocks_access() {
        let device = fake_port_device();
        let mut port = DevPort::open(device.path()).unwrap();

        port.close();
        port.close();
        assert!(!port.is_open());
        assert!(matches!(port.read_byte(0x66), Err(EcFanError::PortClosed)));
        assert!(matches!(port.write_byte(0x62, 1), Err(EcFanError::PortClosed)));

        // Drop after an explicit close must not release someone else's handle
        let other = DevPort::open(device.path()).unwrap();
        drop(port);
        assert!(matches!(
            DevPort::open(device.path()).unwrap_err(),
            EcFanError::PortBusy
        ));
        drop(other);
    }
}
