//! Socket-multiplexing mediator
//!
//! The mediator sits between the single shared platform transport handle and
//! the multiplayer session instances active in the process. Every tick it
//! drains the transport and sorts received packets into per-socket queues so
//! the owning peer can poll them later; connection lifecycle notifications
//! are forwarded to the peer registered for their socket. Connection requests
//! that arrive before any peer has opened the target socket are buffered and
//! replayed when a matching peer registers.
//!
//! Lifecycle is bound to the platform login state: a login success
//! initializes the mediator, any transition away from logged-in terminates
//! it. All entry points run on the host's logical thread; a multi-threaded
//! host serializes them behind a single mutex.

use std::collections::VecDeque;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::config::MediatorConfig;
use crate::errors::{MediatorError, Result, TransportError};
use crate::packet::{Packet, MAX_PACKET_SIZE};
use crate::peer::SessionPeer;
use crate::transport::{
    ConnectionRequest, NotificationKind, P2pTransport, SubscriptionId, TransportNotification,
};
use crate::types::{LoginStatus, SocketId, SystemTimeSource, TimeSource, Timestamp, UserId};

// ----------------------------------------------------------------------------
// Mediator Events
// ----------------------------------------------------------------------------

/// Events the mediator surfaces to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediatorEvent {
    /// The total queued packet count rose above the configured limit;
    /// remaining transport traffic is deferred to the next tick
    PacketQueueFull,
    /// A connection request arrived for a socket with no registered peer and
    /// was buffered
    ConnectionRequestReceived(ConnectionRequest),
    /// A buffered connection request left the buffer (claimed, closed by the
    /// remote side, or expired)
    ConnectionRequestRemoved(ConnectionRequest),
}

/// Trait for handling mediator events
pub trait MediatorEventHandler: Send {
    /// Handle a mediator event
    fn handle_event(&mut self, event: MediatorEvent);
}

// ----------------------------------------------------------------------------
// Pending Connection Requests
// ----------------------------------------------------------------------------

/// A buffered connection request awaiting a peer to claim its socket
#[derive(Debug, Clone)]
struct PendingRequest {
    request: ConnectionRequest,
    received_at: Timestamp,
}

// ----------------------------------------------------------------------------
// Mediator
// ----------------------------------------------------------------------------

/// Demultiplexes one shared platform transport into per-socket packet queues
/// and notification streams.
///
/// Constructed explicitly by the host's multiplayer subsystem and driven by
/// three externally observed signals: login events, the per-frame tick, and
/// transport notifications.
pub struct Mediator<T: P2pTransport, C: TimeSource = SystemTimeSource> {
    transport: T,
    time_source: C,
    config: MediatorConfig,
    initialized: bool,
    local_user: Option<UserId>,
    queues: HashMap<SocketId, VecDeque<Packet>>,
    peers: HashMap<SocketId, Box<dyn SessionPeer>>,
    pending_requests: Vec<PendingRequest>,
    subscriptions: SmallVec<[(NotificationKind, SubscriptionId); 4]>,
    event_handler: Option<Box<dyn MediatorEventHandler>>,
}

impl<T: P2pTransport> Mediator<T> {
    /// Create a mediator with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MediatorConfig::default())
    }

    /// Create a mediator with a custom configuration
    pub fn with_config(transport: T, config: MediatorConfig) -> Self {
        Self::with_time_source(transport, config, SystemTimeSource)
    }
}

impl<T: P2pTransport, C: TimeSource> Mediator<T, C> {
    /// Create a mediator with a custom configuration and time source
    pub fn with_time_source(transport: T, config: MediatorConfig, time_source: C) -> Self {
        Self {
            transport,
            time_source,
            config,
            initialized: false,
            local_user: None,
            queues: HashMap::new(),
            peers: HashMap::new(),
            pending_requests: Vec::new(),
            subscriptions: SmallVec::new(),
            event_handler: None,
        }
    }

    /// Install the handler that receives [`MediatorEvent`]s
    pub fn set_event_handler(&mut self, handler: Box<dyn MediatorEventHandler>) {
        self.event_handler = Some(handler);
    }

    /// Shared platform transport handle; the mediator only drains it, sending
    /// stays with the host
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the shared platform transport handle
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Bring the mediator up for the given local account.
    ///
    /// Subscribes the four connection notification kinds through the
    /// transport. No-op if already initialized. If any subscription fails,
    /// the ones already added are rolled back and the mediator stays down.
    pub fn initialize(&mut self, local_user: UserId) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let mut subscriptions: SmallVec<[(NotificationKind, SubscriptionId); 4]> = SmallVec::new();
        for kind in NotificationKind::ALL {
            let id = self.transport.add_notification(kind, &local_user);
            if !id.is_valid() {
                for (added_kind, added_id) in subscriptions {
                    self.transport.remove_notification(added_kind, added_id);
                }
                return Err(TransportError::SubscriptionFailed { kind }.into());
            }
            subscriptions.push((kind, id));
        }

        self.subscriptions = subscriptions;
        self.local_user = Some(local_user);
        self.initialized = true;
        debug!("mediator initialized");
        Ok(())
    }

    /// Tear the mediator down.
    ///
    /// Unsubscribes all notifications and clears the local user identity.
    /// Active sessions do not survive a logout: registered peers, their
    /// queues, and pending connection requests are dropped. No-op if already
    /// uninitialized.
    pub fn terminate(&mut self) {
        if !self.initialized {
            return;
        }

        for (kind, id) in std::mem::take(&mut self.subscriptions) {
            self.transport.remove_notification(kind, id);
        }

        self.local_user = None;
        self.peers.clear();
        self.queues.clear();
        self.pending_requests.clear();
        self.initialized = false;
        debug!("mediator terminated");
    }

    /// The identity provider reported a successful login
    pub fn handle_login(&mut self, local_user: UserId) -> Result<()> {
        self.initialize(local_user)
    }

    /// The identity provider reported a login status change; anything other
    /// than logged-in takes the mediator down
    pub fn handle_login_status_changed(&mut self, status: LoginStatus) {
        if status == LoginStatus::LoggedIn {
            return;
        }
        self.terminate();
    }

    /// Check whether the mediator is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The logged-in local account, while initialized
    pub fn local_user(&self) -> Option<&UserId> {
        self.local_user.as_ref()
    }

    // ------------------------------------------------------------------------
    // Packet Ingestion
    // ------------------------------------------------------------------------

    /// Drain the transport once; the host calls this every logical frame.
    ///
    /// Received packets are sorted into the queue of their destination
    /// socket, peer-identity packets at the front. Ingestion stops early when
    /// a packet targets an unregistered socket (the packet is dropped) or
    /// when the total queued count rises above the configured limit. The
    /// packet that crossed the limit is kept, remaining transport traffic is
    /// left for the next tick, and [`MediatorEvent::PacketQueueFull`] fires.
    pub fn tick(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }

        self.expire_pending_requests();

        let Some(local_user) = self.local_user.clone() else {
            return Ok(());
        };
        if self.queues.is_empty() {
            return Ok(());
        }
        if self.total_packet_count() >= self.config.queue_size_limit {
            return Ok(());
        }

        while self.transport.next_packet_size(&local_user)?.is_some() {
            let inbound = self.transport.receive_packet(&local_user, MAX_PACKET_SIZE)?;

            let Some(queue) = self.queues.get_mut(&inbound.socket) else {
                debug!(socket = %inbound.socket, "dropping packet for unregistered socket");
                break;
            };

            let packet = Packet::new(inbound.payload, inbound.channel, inbound.sender);
            if packet.is_peer_identity() {
                queue.push_front(packet);
            } else {
                queue.push_back(packet);
            }

            if self.total_packet_count() > self.config.queue_size_limit {
                warn!(
                    limit = self.config.queue_size_limit,
                    "packet queue limit reached, deferring remaining traffic"
                );
                self.emit(MediatorEvent::PacketQueueFull);
                break;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Peer Registration
    // ------------------------------------------------------------------------

    /// Register a peer and its socket with the mediator.
    ///
    /// Once registered, the peer receives packets, notifications, and
    /// connection requests for its socket. Any connection requests already
    /// buffered for the socket are replayed to the peer immediately, each one
    /// leaving the buffer with a [`MediatorEvent::ConnectionRequestRemoved`].
    pub fn register_peer(&mut self, peer: Box<dyn SessionPeer>) -> Result<()> {
        if !self.initialized {
            return Err(MediatorError::NotInitialized);
        }
        let socket = peer.socket_id().ok_or(MediatorError::PeerNotActive)?;
        if socket.is_empty() {
            return Err(MediatorError::PeerNotActive);
        }
        if self.peers.contains_key(&socket) {
            return Err(MediatorError::SocketAlreadyRegistered(socket));
        }

        self.queues.insert(socket.clone(), VecDeque::new());
        self.peers.insert(socket.clone(), peer);
        debug!(socket = %socket, "peer registered");

        self.forward_pending_requests(&socket);
        Ok(())
    }

    /// Unregister the peer owning the given socket, handing its handle back.
    ///
    /// Drops the socket's queue and any packets still in it. Returns `None`
    /// if no peer is registered for the socket.
    pub fn unregister_peer(&mut self, socket: &SocketId) -> Option<Box<dyn SessionPeer>> {
        let peer = self.peers.remove(socket)?;
        self.queues.remove(socket);
        debug!(socket = %socket, "peer unregistered");
        Some(peer)
    }

    /// Check whether a peer is registered for the given socket
    pub fn has_socket(&self, socket: &SocketId) -> bool {
        self.peers.contains_key(socket)
    }

    /// Currently registered socket descriptors
    pub fn sockets(&self) -> Vec<SocketId> {
        self.peers.keys().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Packet Queues
    // ------------------------------------------------------------------------

    /// Remove and return the front packet of the given socket's queue, or
    /// `None` if the socket is unknown or its queue is empty
    pub fn poll_next_packet(&mut self, socket: &SocketId) -> Option<Packet> {
        self.queues.get_mut(socket)?.pop_front()
    }

    /// Check whether the next packet queued for the socket carries a
    /// peer-identity announcement
    pub fn next_packet_is_peer_identity(&self, socket: &SocketId) -> Result<bool> {
        let queue = self
            .queues
            .get(socket)
            .ok_or_else(|| MediatorError::SocketNotRegistered(socket.clone()))?;
        Ok(queue.front().is_some_and(Packet::is_peer_identity))
    }

    /// Remove all packets queued for the given socket
    pub fn clear_packet_queue(&mut self, socket: &SocketId) -> Result<()> {
        let queue = self
            .queues
            .get_mut(socket)
            .ok_or_else(|| MediatorError::SocketNotRegistered(socket.clone()))?;
        queue.clear();
        Ok(())
    }

    /// Remove the packets a given remote account sent to the given socket,
    /// preserving the relative order of everything else. Called when a remote
    /// peer disconnects.
    pub fn clear_packets_from_remote_user(
        &mut self,
        socket: &SocketId,
        remote_user: &UserId,
    ) -> Result<()> {
        let queue = self
            .queues
            .get_mut(socket)
            .ok_or_else(|| MediatorError::SocketNotRegistered(socket.clone()))?;
        queue.retain(|packet| packet.sender() != remote_user);
        Ok(())
    }

    /// Total packet count across all socket queues
    pub fn total_packet_count(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Packet count queued for one socket; zero if the socket is unknown
    pub fn packet_count_for_socket(&self, socket: &SocketId) -> usize {
        self.queues.get(socket).map_or(0, VecDeque::len)
    }

    /// Packets queued for one socket that a given remote account sent; zero
    /// if the socket is unknown
    pub fn packet_count_from_remote_user(&self, socket: &SocketId, remote_user: &UserId) -> usize {
        self.queues.get(socket).map_or(0, |queue| {
            queue
                .iter()
                .filter(|packet| packet.sender() == remote_user)
                .count()
        })
    }

    /// Current soft cap on the total queued packet count
    pub fn queue_size_limit(&self) -> usize {
        self.config.queue_size_limit
    }

    /// Adjust the soft cap on the total queued packet count
    pub fn set_queue_size_limit(&mut self, limit: usize) {
        self.config.queue_size_limit = limit;
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    /// Route one connection lifecycle notification.
    ///
    /// Establishment and interruption are forwarded to the peer registered
    /// for the socket and otherwise dropped. Closure additionally retires a
    /// matching pending connection request. Requests are forwarded directly
    /// when a peer has the socket open and buffered otherwise.
    pub fn handle_notification(&mut self, notification: TransportNotification) {
        if self.local_user.as_ref() != Some(notification.local_user()) {
            warn!("discarding notification scoped to a different local user");
            return;
        }

        match notification {
            TransportNotification::ConnectionEstablished(info) => {
                match self.peers.get_mut(&info.socket) {
                    Some(peer) => peer.on_connection_established(&info),
                    None => debug!(socket = %info.socket, "no peer for established notification"),
                }
            }
            TransportNotification::ConnectionInterrupted(info) => {
                match self.peers.get_mut(&info.socket) {
                    Some(peer) => peer.on_connection_interrupted(&info),
                    None => debug!(socket = %info.socket, "no peer for interrupted notification"),
                }
            }
            TransportNotification::ConnectionClosed(info) => {
                // A closed connection cannot be a still-pending request.
                let matched = self.pending_requests.iter().position(|entry| {
                    entry.request.remote_user == info.remote_user
                        && entry.request.socket == info.socket
                });
                if let Some(index) = matched {
                    let entry = self.pending_requests.remove(index);
                    self.emit(MediatorEvent::ConnectionRequestRemoved(entry.request));
                }
                if let Some(peer) = self.peers.get_mut(&info.socket) {
                    peer.on_connection_closed(&info);
                }
            }
            TransportNotification::ConnectionRequest(request) => {
                if let Some(peer) = self.peers.get_mut(&request.socket) {
                    peer.on_connection_request(&request);
                    return;
                }
                // Hold onto the request in case a socket opens with this id.
                let received_at = self.time_source.now();
                self.pending_requests.push(PendingRequest {
                    request: request.clone(),
                    received_at,
                });
                self.emit(MediatorEvent::ConnectionRequestReceived(request));
            }
        }
    }

    /// Number of buffered connection requests awaiting a matching socket
    pub fn pending_connection_request_count(&self) -> usize {
        self.pending_requests.len()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Replay buffered connection requests to a newly registered peer.
    /// Two passes: pull the matching entries out, then deliver.
    fn forward_pending_requests(&mut self, socket: &SocketId) {
        let mut matching: SmallVec<[ConnectionRequest; 4]> = SmallVec::new();
        self.pending_requests.retain(|entry| {
            if entry.request.socket == *socket {
                matching.push(entry.request.clone());
                false
            } else {
                true
            }
        });

        for request in matching {
            if let Some(peer) = self.peers.get_mut(socket) {
                peer.on_connection_request(&request);
            }
            self.emit(MediatorEvent::ConnectionRequestRemoved(request));
        }
    }

    /// Drop buffered requests older than the configured expiry window
    fn expire_pending_requests(&mut self) {
        let Some(window) = self.config.pending_request_expiry else {
            return;
        };
        if self.pending_requests.is_empty() {
            return;
        }

        let now = self.time_source.now();
        let mut expired: SmallVec<[ConnectionRequest; 4]> = SmallVec::new();
        self.pending_requests.retain(|entry| {
            if now.duration_since(entry.received_at) >= window {
                expired.push(entry.request.clone());
                false
            } else {
                true
            }
        });

        for request in expired {
            debug!(socket = %request.socket, "pending connection request expired");
            self.emit(MediatorEvent::ConnectionRequestRemoved(request));
        }
    }

    fn emit(&mut self, event: MediatorEvent) {
        if let Some(handler) = self.event_handler.as_mut() {
            handler.handle_event(event);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
