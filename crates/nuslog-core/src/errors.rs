//! Error types for the capture core
//!
//! Decode errors are local to a single notification and never end a session.
//! Capture errors cover the CSV files on disk. Link errors are reported by the
//! transport behind a [`crate::session::Link`].

use std::path::PathBuf;

use thiserror::Error;

// ----------------------------------------------------------------------------
// Packet Decoding
// ----------------------------------------------------------------------------

/// Reasons a notification payload could not be decoded into a telemetry packet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("No device name delimiter found in {length}-byte payload")]
    NoDelimiter { length: usize },

    #[error("Payload truncated: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Payload has {extra} unexpected trailing bytes")]
    TrailingBytes { extra: usize },
}

// ----------------------------------------------------------------------------
// Capture Files
// ----------------------------------------------------------------------------

/// Errors raised while writing or splitting capture logs
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Capture log {path} has no header row")]
    MissingHeader { path: PathBuf },
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CaptureError::Csv {
            path: path.into(),
            source,
        }
    }
}

// ----------------------------------------------------------------------------
// Session Links
// ----------------------------------------------------------------------------

/// Errors reported by a session's outbound link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Failed to write to device: {0}")]
    Write(String),

    #[error("Failed to disconnect device: {0}")]
    Disconnect(String),
}
