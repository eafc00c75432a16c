//! Peripheral discovery
//!
//! Scans for a fixed window and keeps the peripherals whose advertisement lists
//! the configured service. The scan filter alone is not enough: some platform
//! backends ignore it, so the advertised service list is checked again.

use std::fmt;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use nuslog_core::DeviceIdentity;
use tracing::{debug, info, warn};

use crate::config::BleConfig;
use crate::error::{BleError, Result};
use crate::protocol::{advertises_service, display_name};

// ----------------------------------------------------------------------------
// Discovered Devices
// ----------------------------------------------------------------------------

/// A peripheral found during a scan
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: String,
    pub address: String,
    pub peripheral: Peripheral,
}

impl DiscoveredDevice {
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.name.clone(), self.address.clone())
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

// ----------------------------------------------------------------------------
// Discovery Implementation
// ----------------------------------------------------------------------------

/// Handles adapter setup and scanning
pub struct BleDiscovery {
    config: BleConfig,
    adapter: Adapter,
}

impl BleDiscovery {
    /// Open the first available BLE adapter
    pub async fn initialize(config: BleConfig) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(BleError::AdapterNotAvailable)?;

        match adapter.adapter_info().await {
            Ok(info) => info!("BLE adapter initialized: {}", info),
            Err(_) => info!("BLE adapter initialized"),
        }
        Ok(Self { config, adapter })
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn config(&self) -> &BleConfig {
        &self.config
    }

    /// Scan for the configured window and list matching peripherals
    pub async fn scan(&self) -> Result<Vec<DiscoveredDevice>> {
        let filter = ScanFilter {
            services: vec![self.config.service_uuid],
        };
        self.adapter
            .start_scan(filter)
            .await
            .map_err(|e| BleError::ScanFailed(e.to_string()))?;
        info!(
            "Scanning for {:.1}s for service {}",
            self.config.scan_timeout.as_secs_f32(),
            self.config.service_uuid
        );

        tokio::time::sleep(self.config.scan_timeout).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop BLE scan: {}", e);
        }

        let mut devices = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            let properties = match peripheral.properties().await {
                Ok(Some(properties)) => properties,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping peripheral without properties: {}", e);
                    continue;
                }
            };

            if !advertises_service(&properties.services, self.config.service_uuid) {
                continue;
            }

            let device = DiscoveredDevice {
                name: display_name(properties.local_name),
                address: properties.address.to_string(),
                peripheral,
            };
            debug!("Discovered {}", device);
            devices.push(device);
        }

        info!("Found {} matching peripherals", devices.len());
        Ok(devices)
    }
}
