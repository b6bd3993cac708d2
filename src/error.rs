//! # Error Types
//!
//! Custom error types for Colmi Ring using `thiserror`.

use thiserror::Error;

/// Main error type for Colmi Ring
#[derive(Debug, Error)]
pub enum RingError {
    /// Command sub-payload does not fit into a 16-byte frame
    #[error("Sub-payload too long: {0} bytes (maximum 14)")]
    SubPayloadTooLong(usize),

    /// Hex command template could not be parsed
    #[error("Invalid hex command template '{template}': {reason}")]
    InvalidHexTemplate { template: String, reason: String },

    /// BLE transport errors (write, subscribe, connect)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configured ring was not seen by the adapter
    #[error("Ring not found: {0}")]
    DeviceNotFound(String),

    /// Required GATT characteristic missing on the connected ring
    #[error("Characteristic {0} not found")]
    CharacteristicNotFound(uuid::Uuid),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON output errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<btleplug::Error> for RingError {
    fn from(err: btleplug::Error) -> Self {
        RingError::Transport(err.to_string())
    }
}

/// Result type alias for Colmi Ring
pub type Result<T> = std::result::Result<T, RingError>;
