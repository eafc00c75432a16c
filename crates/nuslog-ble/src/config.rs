//! BLE transport configuration

use std::time::Duration;

use uuid::Uuid;

use crate::protocol::{MIN_WRITE_CHUNK, NUS_SERVICE_UUID};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for scanning and connecting to peripherals
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BleConfig {
    /// Length of the discovery window
    pub scan_timeout: Duration,
    /// Maximum time to wait for a connection or service discovery
    pub connection_timeout: Duration,
    /// Largest single write sent to a peripheral
    pub write_chunk_size: usize,
    /// Service peripherals must advertise to be listed
    pub service_uuid: Uuid,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(10),
            write_chunk_size: MIN_WRITE_CHUNK,
            service_uuid: NUS_SERVICE_UUID,
        }
    }
}

impl BleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scan timeout
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set maximum write size
    pub fn with_write_chunk_size(mut self, size: usize) -> Self {
        self.write_chunk_size = size;
        self
    }

    /// Set the service to match during discovery
    pub fn with_service_uuid(mut self, uuid: Uuid) -> Self {
        self.service_uuid = uuid;
        self
    }
}
