//! Nordic UART Service constants and matching helpers

use uuid::Uuid;

// ----------------------------------------------------------------------------
// BLE Service and Characteristic UUIDs
// ----------------------------------------------------------------------------

/// Nordic UART Service UUID
pub const NUS_SERVICE_UUID: Uuid = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);

/// Characteristic the central writes to (peripheral RX)
pub const NUS_RX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E);

/// Characteristic the peripheral notifies on (peripheral TX)
pub const NUS_TX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E);

/// Smallest ATT write payload every link supports
pub const MIN_WRITE_CHUNK: usize = 20;

/// Name shown for peripherals that advertise no local name
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown";

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Whether an advertised service list contains `service`
pub fn advertises_service(services: &[Uuid], service: Uuid) -> bool {
    services.contains(&service)
}

/// Display name for an advertised local name
pub fn display_name(local_name: Option<String>) -> String {
    match local_name {
        Some(name) if !name.is_empty() => name,
        _ => UNKNOWN_DEVICE_NAME.to_string(),
    }
}

/// Split an outbound message into link-sized writes
///
/// A chunk size of zero is treated as one byte per write.
pub fn write_chunks(data: &[u8], chunk_size: usize) -> std::slice::Chunks<'_, u8> {
    data.chunks(chunk_size.max(1))
}
