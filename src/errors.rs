//! Error types for the fan daemon

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the fan daemon
pub type Result<T> = std::result::Result<T, EcFanError>;

/// Main error type for the fan daemon
#[derive(Error, Debug)]
pub enum EcFanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open port device {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Port device is already open in this process")]
    PortBusy,

    #[error("Port device has been closed")]
    PortClosed,

    #[error("Cannot open status log {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to detach from terminal: {0}")]
    Detach(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failed_message_names_path() {
        let err = EcFanError::OpenFailed {
            path: PathBuf::from("/dev/port"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/port"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: EcFanError = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, EcFanError::Io(_)));
    }
}
