//! Error handling for the nuslog CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bluetooth error: {0}")]
    Ble(#[from] nuslog_ble::BleError),

    #[error("Capture error: {0}")]
    Capture(#[from] nuslog_core::CaptureError),

    #[error("No matching peripherals found")]
    NoPeripherals,

    #[error("No peripheral could be connected")]
    NoSessions,

    #[error("Invalid device selection: {0}")]
    Selection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
