//! Bluetooth Low Energy transport for Nordic UART telemetry peripherals
//!
//! This crate connects `nuslog-core` to real hardware through `btleplug`.
//!
//! ## Architecture
//!
//! - [`config`] - Scan and connection settings
//! - [`error`] - Error types specific to the BLE transport
//! - [`protocol`] - Nordic UART Service UUIDs and matching helpers
//! - [`discovery`] - Adapter setup and peripheral scanning
//! - [`connection`] - Session establishment, notification forwarding and the
//!   [`Link`](nuslog_core::Link) implementation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nuslog_ble::{BleConfig, BleConnector, BleDiscovery};
//! use nuslog_core::{SessionIndex, SessionRegistry};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = BleDiscovery::initialize(BleConfig::new()).await?;
//! let devices = discovery.scan().await?;
//!
//! let (events_tx, _events_rx) = mpsc::channel(256);
//! let mut connector =
//!     BleConnector::new(discovery.adapter(), discovery.config().clone(), events_tx).await?;
//!
//! let mut registry = SessionRegistry::new();
//! for device in &devices {
//!     let index = registry.allocate_index();
//!     let link = connector.connect(index, device).await?;
//!     registry.register(index, device.identity(), link);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod discovery;
mod error;
mod protocol;

pub use config::BleConfig;
pub use connection::{BleConnector, BleLink};
pub use discovery::{BleDiscovery, DiscoveredDevice};
pub use error::{BleError, Result};
pub use protocol::{
    advertises_service, display_name, write_chunks, MIN_WRITE_CHUNK, NUS_RX_CHARACTERISTIC_UUID,
    NUS_SERVICE_UUID, NUS_TX_CHARACTERISTIC_UUID, UNKNOWN_DEVICE_NAME,
};
