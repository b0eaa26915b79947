//! Per-tick status lines appended to a persistent log file

use crate::errors::{EcFanError, Result};
use crate::fan::FanState;
use chrono::{DateTime, Local};
use log::debug;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// One observation of the control loop
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub timestamp: DateTime<Local>,
    pub fan_state: FanState,
    pub temperature: u8,
}

impl StatusLine {
    pub fn now(fan_state: FanState, temperature: u8) -> Self {
        Self {
            timestamp: Local::now(),
            fan_state,
            temperature,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] fan_state: {} temp: {} deg c",
            self.timestamp.format("%c"),
            self.fan_state.as_u8(),
            self.temperature
        )
    }
}

/// Status line sink.
///
/// When disabled every record is dropped. When enabled, lines are appended
/// to the log file and mirrored to stdout if `console` is set.
#[derive(Debug)]
pub struct StatusLog {
    path: Option<PathBuf>,
    file: Option<File>,
    console: bool,
}

impl StatusLog {
    /// Open (creating with mode 0600) the log file for appending
    pub fn open(path: impl AsRef<Path>, console: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(&path)
            .map_err(|source| EcFanError::LogSink {
                path: path.clone(),
                source,
            })?;
        debug!("Status log opened at {}", path.display());

        Ok(Self {
            path: Some(path),
            file: Some(file),
            console,
        })
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            file: None,
            console: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn record(&mut self, line: &StatusLine) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        let text = format!("{}\n", line);
        if self.console {
            print!("{}", text);
        }
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Flush and release the file. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
            if let Some(path) = &self.path {
                debug!("Status log closed at {}", path.display());
            }
        }
    }
}

impl Drop for StatusLog {
    fn drop(&mut self) {
        self.close();
    }
}
