//! # Error Types
//!
//! Custom error types for Arduino Pad Bridge using `thiserror`.

use thiserror::Error;

/// Reasons a serial line is rejected before it reaches the signal mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Line was blank after trimming
    #[error("empty frame")]
    Empty,

    /// Line did not split into exactly twelve fields
    #[error("expected 12 fields, found {found}")]
    FieldCount { found: usize },

    /// A field was not a decimal integer
    #[error("field {index} is not an integer: {value:?}")]
    Parse { index: usize, value: String },
}

/// Main error type for Arduino Pad Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Serial port could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Virtual gamepad rejected an update
    #[error("Device write error: {0}")]
    DeviceWrite(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Arduino Pad Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
