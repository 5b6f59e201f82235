//! # Error Types
//!
//! Custom error types for Clutch Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Clutch Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Operation invoked on a pipeline that is not initialized
    #[error("pipeline not initialized")]
    NotInitialized,

    /// Required input missing or inconsistent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload shorter than the minimum packet size
    #[error("invalid size: got {actual} bytes, need at least {expected}")]
    InvalidSize { expected: usize, actual: usize },

    /// Calibration start requested while a session is open
    #[error("calibration already in progress")]
    AlreadyInProgress,

    /// Calibration stop requested while no session is open
    #[error("calibration not active")]
    NotActive,

    /// Malformed operator console input
    #[error("command error: {0}")]
    Command(String),

    /// Serial link errors
    #[error("serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("no serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Clutch Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_size_message() {
        let err = BridgeError::InvalidSize { expected: 4, actual: 2 };
        assert_eq!(err.to_string(), "invalid size: got 2 bytes, need at least 4");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
