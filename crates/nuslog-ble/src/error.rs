//! Error types for the BLE transport

use nuslog_core::LinkError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the BLE transport
#[derive(Error, Debug)]
pub enum BleError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("Failed to scan for peripherals: {0}")]
    ScanFailed(String),

    #[error("Failed to connect to {device}: {reason}")]
    ConnectionFailed { device: String, reason: String },

    #[error("Connection to {device} timed out")]
    ConnectionTimeout { device: String },

    #[error("Failed to discover services on {device}: {reason}")]
    ServiceDiscoveryFailed { device: String, reason: String },

    #[error("Characteristic not found on {device}: {characteristic}")]
    CharacteristicNotFound {
        device: String,
        characteristic: String,
    },

    #[error("Failed to subscribe to notifications: {0}")]
    SubscriptionFailed(String),

    #[error("Failed to get notifications stream: {0}")]
    NotificationStreamFailed(String),

    #[error("Failed to write to characteristic: {0}")]
    WriteFailed(String),

    #[error("Bluetooth error: {0}")]
    Btleplug(#[from] btleplug::Error),
}

impl From<BleError> for LinkError {
    fn from(err: BleError) -> Self {
        match err {
            BleError::WriteFailed(reason) => LinkError::Write(reason),
            other => LinkError::Disconnect(other.to_string()),
        }
    }
}

/// Result type for BLE operations
pub type Result<T> = std::result::Result<T, BleError>;
