//! Device session registry
//!
//! A session is the live, addressable connection to one peripheral. Sessions
//! are keyed by a [`SessionIndex`] assigned once, in connection order, and never
//! reused within a process run. A session lives in the registry exactly as long
//! as it is connected.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::LinkError;
use crate::packet::TelemetryPacket;

// ----------------------------------------------------------------------------
// Session Types
// ----------------------------------------------------------------------------

/// Logical index of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionIndex(pub usize);

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-level identity of a peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: String,
    pub address: String,
}

impl DeviceIdentity {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Outbound half of a connected peripheral
///
/// Writes are plain bytes; chunking to the link's maximum write size is the
/// implementation's job. No acknowledgment is expected.
#[async_trait]
pub trait Link: Send + Sync {
    async fn write(&self, data: &[u8]) -> Result<(), LinkError>;

    async fn disconnect(&self) -> Result<(), LinkError>;
}

/// Messages from per-session tasks to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A notification decoded into a packet
    Packet {
        index: SessionIndex,
        packet: TelemetryPacket,
    },
    /// The transport reported the session as gone
    Disconnected { index: SessionIndex },
}

/// One connected peripheral
#[derive(Debug)]
pub struct DeviceSession<L> {
    pub index: SessionIndex,
    pub identity: DeviceIdentity,
    pub link: L,
}

/// Outcome of writing one message to every session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<SessionIndex>,
    pub failed: Vec<(SessionIndex, LinkError)>,
}

// ----------------------------------------------------------------------------
// Registry
// ----------------------------------------------------------------------------

/// Connected sessions by index
#[derive(Debug)]
pub struct SessionRegistry<L> {
    sessions: BTreeMap<SessionIndex, DeviceSession<L>>,
    next_index: usize,
}

impl<L> Default for SessionRegistry<L> {
    fn default() -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_index: 0,
        }
    }
}

impl<L: Link> SessionRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next session index
    ///
    /// Transports that must tag events before the connection completes reserve
    /// an index first and [`register`](Self::register) on success. An index
    /// whose connection fails is never handed out again.
    pub fn allocate_index(&mut self) -> SessionIndex {
        let index = SessionIndex(self.next_index);
        self.next_index += 1;
        index
    }

    /// Add a connected session under a reserved index
    pub fn register(&mut self, index: SessionIndex, identity: DeviceIdentity, link: L) {
        info!("Session {} registered for {}", index, identity);
        self.sessions.insert(
            index,
            DeviceSession {
                index,
                identity,
                link,
            },
        );
    }

    /// Allocate an index and register the session under it
    pub fn connect(&mut self, identity: DeviceIdentity, link: L) -> SessionIndex {
        let index = self.allocate_index();
        self.register(index, identity, link);
        index
    }

    pub fn get(&self, index: SessionIndex) -> Option<&DeviceSession<L>> {
        self.sessions.get(&index)
    }

    pub fn indices(&self) -> Vec<SessionIndex> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Write `data` to every connected session, in index order
    ///
    /// A failing session does not stop the fan-out.
    pub async fn broadcast(&self, data: &[u8]) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for (index, session) in &self.sessions {
            match session.link.write(data).await {
                Ok(()) => report.delivered.push(*index),
                Err(e) => {
                    warn!("Failed to write to session {}: {}", index, e);
                    report.failed.push((*index, e));
                }
            }
        }
        debug!(
            "Broadcast {} bytes to {} sessions",
            data.len(),
            report.delivered.len()
        );
        report
    }

    /// Disconnect one session and remove it
    pub async fn disconnect(&mut self, index: SessionIndex) -> Option<DeviceSession<L>> {
        let session = self.sessions.remove(&index)?;
        if let Err(e) = session.link.disconnect().await {
            warn!("Failed to disconnect session {}: {}", index, e);
        }
        Some(session)
    }

    /// Disconnect and remove every session, returning them in index order
    pub async fn disconnect_all(&mut self) -> Vec<DeviceSession<L>> {
        let sessions = std::mem::take(&mut self.sessions);
        let mut closed = Vec::with_capacity(sessions.len());
        for (index, session) in sessions {
            if let Err(e) = session.link.disconnect().await {
                warn!("Failed to disconnect session {}: {}", index, e);
            }
            closed.push(session);
        }
        closed
    }

    /// Remove a session the transport reported as disconnected
    ///
    /// Returns `None` when the session was already gone, so duplicate reports
    /// are harmless.
    pub fn on_disconnect(&mut self, index: SessionIndex) -> Option<DeviceSession<L>> {
        let session = self.sessions.remove(&index)?;
        info!("Session {} ({}) disconnected", index, session.identity);
        Some(session)
    }
}
