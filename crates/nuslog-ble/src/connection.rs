//! Session establishment and per-session tasks
//!
//! [`BleConnector`] connects discovered peripherals, subscribes to their
//! notification characteristic and spawns one task per session that decodes
//! notifications into [`SessionEvent`]s. A single disconnect watcher follows
//! the adapter's event stream, since a dropped link often shows up there
//! before the notification stream closes.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Peripheral as _, ValueNotification, WriteType,
};
use btleplug::platform::{Adapter, Peripheral, PeripheralId};
use futures::stream::{Stream, StreamExt};
use nuslog_core::{Link, LinkError, SessionEvent, SessionIndex, TelemetryPacket};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::BleConfig;
use crate::discovery::DiscoveredDevice;
use crate::error::{BleError, Result};
use crate::protocol::{write_chunks, NUS_RX_CHARACTERISTIC_UUID, NUS_TX_CHARACTERISTIC_UUID};

// ----------------------------------------------------------------------------
// Link
// ----------------------------------------------------------------------------

/// Outbound half of a connected peripheral
#[derive(Debug, Clone)]
pub struct BleLink {
    peripheral: Peripheral,
    rx_characteristic: Characteristic,
    chunk_size: usize,
}

#[async_trait]
impl Link for BleLink {
    async fn write(&self, data: &[u8]) -> std::result::Result<(), LinkError> {
        for chunk in write_chunks(data, self.chunk_size) {
            self.peripheral
                .write(&self.rx_characteristic, chunk, WriteType::WithoutResponse)
                .await
                .map_err(|e| BleError::WriteFailed(e.to_string()))?;
        }
        debug!("Wrote {} bytes to {:?}", data.len(), self.peripheral.id());
        Ok(())
    }

    async fn disconnect(&self) -> std::result::Result<(), LinkError> {
        self.peripheral.disconnect().await.map_err(BleError::from)?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Connection Management
// ----------------------------------------------------------------------------

/// Connects peripherals and owns the tasks feeding the controller
pub struct BleConnector {
    config: BleConfig,
    events: mpsc::Sender<SessionEvent>,
    sessions: Arc<RwLock<HashMap<PeripheralId, SessionIndex>>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl BleConnector {
    /// Create a connector and start the disconnect watcher on `adapter`
    pub async fn new(
        adapter: &Adapter,
        config: BleConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        let sessions = Arc::new(RwLock::new(HashMap::new()));

        let central_events = adapter
            .events()
            .await
            .map_err(|e| BleError::NotificationStreamFailed(e.to_string()))?;
        let watcher = tokio::spawn(watch_disconnects(
            central_events,
            Arc::clone(&sessions),
            events.clone(),
            shutdown_tx.subscribe(),
        ));

        Ok(Self {
            config,
            events,
            sessions,
            shutdown_tx,
            tasks: vec![watcher],
        })
    }

    /// Connect a peripheral and start forwarding its notifications
    ///
    /// Events from the new session are tagged with `index`.
    pub async fn connect(
        &mut self,
        index: SessionIndex,
        device: &DiscoveredDevice,
    ) -> Result<BleLink> {
        let peripheral = &device.peripheral;
        let name = device.to_string();

        match timeout(self.config.connection_timeout, peripheral.connect()).await {
            Ok(Ok(())) => info!("Connected to {}", name),
            Ok(Err(e)) => {
                error!("Failed to connect to {}: {}", name, e);
                return Err(BleError::ConnectionFailed {
                    device: name,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                error!("Connection to {} timed out", name);
                return Err(BleError::ConnectionTimeout { device: name });
            }
        }

        match timeout(self.config.connection_timeout, peripheral.discover_services()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return self
                    .abandon(
                        peripheral,
                        BleError::ServiceDiscoveryFailed {
                            device: name,
                            reason: e.to_string(),
                        },
                    )
                    .await
            }
            Err(_) => {
                return self
                    .abandon(
                        peripheral,
                        BleError::ServiceDiscoveryFailed {
                            device: name,
                            reason: "timed out".to_string(),
                        },
                    )
                    .await
            }
        }

        let characteristics = peripheral.characteristics();
        let find = |uuid: Uuid| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| BleError::CharacteristicNotFound {
                    device: name.clone(),
                    characteristic: uuid.to_string(),
                })
        };
        let rx_characteristic = match find(NUS_RX_CHARACTERISTIC_UUID) {
            Ok(c) => c,
            Err(e) => return self.abandon(peripheral, e).await,
        };
        let tx_characteristic = match find(NUS_TX_CHARACTERISTIC_UUID) {
            Ok(c) => c,
            Err(e) => return self.abandon(peripheral, e).await,
        };

        if let Err(e) = peripheral.subscribe(&tx_characteristic).await {
            return self
                .abandon(peripheral, BleError::SubscriptionFailed(e.to_string()))
                .await;
        }
        let notifications = match peripheral.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                return self
                    .abandon(peripheral, BleError::NotificationStreamFailed(e.to_string()))
                    .await
            }
        };

        self.sessions.write().await.insert(peripheral.id(), index);
        self.tasks.push(tokio::spawn(forward_notifications(
            index,
            notifications,
            self.events.clone(),
            self.shutdown_tx.subscribe(),
        )));

        Ok(BleLink {
            peripheral: peripheral.clone(),
            rx_characteristic,
            chunk_size: self.config.write_chunk_size,
        })
    }

    /// Stop every session task and the disconnect watcher, then wait for them
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Session task ended abnormally: {}", e);
            }
        }
        debug!("All session tasks stopped");
    }

    async fn abandon(&self, peripheral: &Peripheral, err: BleError) -> Result<BleLink> {
        error!("{}", err);
        if let Err(e) = peripheral.disconnect().await {
            debug!("Failed to drop half-open connection: {}", e);
        }
        Err(err)
    }
}

// ----------------------------------------------------------------------------
// Session Tasks
// ----------------------------------------------------------------------------

/// Decode notifications from one session and forward them to the controller
///
/// Malformed payloads and notifications on other characteristics are skipped.
/// The end of the stream is reported as a disconnect; shutdown ends the task
/// without reporting.
async fn forward_notifications<S>(
    index: SessionIndex,
    mut notifications: S,
    events: mpsc::Sender<SessionEvent>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Stream<Item = ValueNotification> + Unpin,
{
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            notification = notifications.next() => {
                let Some(notification) = notification else {
                    debug!("Notification stream for session {} ended", index);
                    let _ = events.send(SessionEvent::Disconnected { index }).await;
                    break;
                };
                if notification.uuid != NUS_TX_CHARACTERISTIC_UUID {
                    continue;
                }

                match TelemetryPacket::decode(&notification.value) {
                    Ok(packet) => {
                        if events.send(SessionEvent::Packet { index, packet }).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Discarding malformed packet from session {}: {}", index, e);
                        debug!("Payload: {}", hex::encode(&notification.value));
                    }
                }
            }
        }
    }
    debug!("Notification handler for session {} ended", index);
}

/// Map adapter disconnect events to session indices
async fn watch_disconnects(
    mut central_events: Pin<Box<dyn Stream<Item = CentralEvent> + Send>>,
    sessions: Arc<RwLock<HashMap<PeripheralId, SessionIndex>>>,
    events: mpsc::Sender<SessionEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = central_events.next() => match event {
                Some(CentralEvent::DeviceDisconnected(id)) => {
                    let index = sessions.write().await.remove(&id);
                    if let Some(index) = index {
                        debug!("Disconnect watcher: session {} dropped", index);
                        if events.send(SessionEvent::Disconnected { index }).await.is_err() {
                            break;
                        }
                    }
                }
                Some(_) => {}
                None => {
                    warn!("Adapter event stream ended");
                    break;
                }
            },
        }
    }
}
