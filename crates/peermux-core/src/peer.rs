//! Session peer interface
//!
//! One multiplayer session instance owns exactly one socket. The mediator
//! holds a registered handle per socket and forwards connection lifecycle
//! notifications through it; packet delivery stays pull-based via
//! [`poll_next_packet`](crate::mediator::Mediator::poll_next_packet).

use crate::transport::{ConnectionInfo, ConnectionRequest};
use crate::types::SocketId;

// ----------------------------------------------------------------------------
// Session Peer Trait
// ----------------------------------------------------------------------------

/// Callback surface of one multiplayer session instance.
///
/// A registered handle is owned by the mediator until
/// [`unregister_peer`](crate::mediator::Mediator::unregister_peer) hands it
/// back; implementations typically forward into the real session through a
/// channel or shared state.
pub trait SessionPeer: Send {
    /// The socket this peer owns, or `None` while the peer is not active
    fn socket_id(&self) -> Option<SocketId>;

    /// A connection on this peer's socket finished handshaking
    fn on_connection_established(&mut self, info: &ConnectionInfo);

    /// A connection on this peer's socket lost contact and is recovering
    fn on_connection_interrupted(&mut self, info: &ConnectionInfo);

    /// The remote side closed a connection on this peer's socket
    fn on_connection_closed(&mut self, info: &ConnectionInfo);

    /// A remote side asked to connect to this peer's socket
    fn on_connection_request(&mut self, request: &ConnectionRequest);
}

// ----------------------------------------------------------------------------
// Recording Peer (for testing)
// ----------------------------------------------------------------------------

/// Everything a [`RecordingPeer`] observed, shared with the test body
#[cfg(test)]
#[derive(Debug, Default)]
pub struct PeerRecord {
    pub established: Vec<ConnectionInfo>,
    pub interrupted: Vec<ConnectionInfo>,
    pub closed: Vec<ConnectionInfo>,
    pub requests: Vec<ConnectionRequest>,
}

/// Peer double that records every forwarded notification
#[cfg(test)]
pub struct RecordingPeer {
    socket: Option<SocketId>,
    record: std::sync::Arc<std::sync::Mutex<PeerRecord>>,
}

#[cfg(test)]
impl RecordingPeer {
    /// Create an active peer owning `socket`; returns the peer and a shared
    /// handle to its record
    pub fn active(socket: &str) -> (Self, std::sync::Arc<std::sync::Mutex<PeerRecord>>) {
        let record = std::sync::Arc::new(std::sync::Mutex::new(PeerRecord::default()));
        (
            Self {
                socket: Some(SocketId::new(socket)),
                record: record.clone(),
            },
            record,
        )
    }

    /// Create a peer that has not opened a socket yet
    pub fn inactive() -> Self {
        Self {
            socket: None,
            record: Default::default(),
        }
    }
}

#[cfg(test)]
impl SessionPeer for RecordingPeer {
    fn socket_id(&self) -> Option<SocketId> {
        self.socket.clone()
    }

    fn on_connection_established(&mut self, info: &ConnectionInfo) {
        self.record.lock().unwrap().established.push(info.clone());
    }

    fn on_connection_interrupted(&mut self, info: &ConnectionInfo) {
        self.record.lock().unwrap().interrupted.push(info.clone());
    }

    fn on_connection_closed(&mut self, info: &ConnectionInfo) {
        self.record.lock().unwrap().closed.push(info.clone());
    }

    fn on_connection_request(&mut self, request: &ConnectionRequest) {
        self.record.lock().unwrap().requests.push(request.clone());
    }
}
