//! Outbound datagram transport.
//!
//! The interface never touches a socket directly; it talks to a
//! [`Transport`]. Sends are fire-and-forget: a datagram is handed to the
//! socket or dropped, and nothing waits for a reply.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{InterfaceError, InterfaceResult};

/// Outbound half of the link to the exporter.
pub trait Transport: Send {
    /// Whether a send could currently reach the remote.
    fn is_ready(&self) -> bool;

    /// Sends one datagram.
    ///
    /// # Errors
    ///
    /// [`InterfaceError::NotReady`] without a remote endpoint, or the
    /// underlying socket error.
    fn send(&self, datagram: &str) -> InterfaceResult<()>;

    /// Called with the source of every inbound packet.
    fn observe_peer(&self, _peer: SocketAddr) {}
}

/// UDP transport sharing the socket used for inbound packets.
///
/// With no configured remote, the first packet source becomes the remote.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    remote: Arc<RwLock<Option<SocketAddr>>>,
    learn_remote: bool,
}

impl UdpTransport {
    pub fn new(socket: Arc<UdpSocket>, remote: Option<SocketAddr>) -> Self {
        Self {
            socket,
            learn_remote: remote.is_none(),
            remote: Arc::new(RwLock::new(remote)),
        }
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        *self.remote.read()
    }

    pub fn socket(&self) -> &Arc<UdpSocket> {
        &self.socket
    }
}

impl Transport for UdpTransport {
    fn is_ready(&self) -> bool {
        self.remote.read().is_some()
    }

    fn send(&self, datagram: &str) -> InterfaceResult<()> {
        let remote = self.remote().ok_or(InterfaceError::NotReady)?;
        let sent = self.socket.try_send_to(datagram.as_bytes(), remote)?;
        if sent < datagram.len() {
            debug!(remote = %remote, sent, len = datagram.len(), "Short UDP send");
        }
        Ok(())
    }

    fn observe_peer(&self, peer: SocketAddr) {
        if !self.learn_remote {
            return;
        }
        let mut remote = self.remote.write();
        if remote.is_none() {
            info!(remote = %peer, "Learned exporter endpoint from inbound traffic");
            *remote = Some(peer);
        }
    }
}

/// In-memory transport that records every datagram.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<String>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MemoryTransport {
    pub fn new(ready: bool) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            ready: Arc::new(RwLock::new(ready)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        *self.ready.write() = ready;
    }

    /// Datagrams sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Transport for MemoryTransport {
    fn is_ready(&self) -> bool {
        *self.ready.read()
    }

    fn send(&self, datagram: &str) -> InterfaceResult<()> {
        if !self.is_ready() {
            return Err(InterfaceError::NotReady);
        }
        self.sent.lock().push(datagram.to_string());
        Ok(())
    }
}
