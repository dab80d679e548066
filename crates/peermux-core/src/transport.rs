//! Platform transport abstraction
//!
//! The platform networking service hands the process a single shared handle
//! carrying every socket's inbound traffic plus connection lifecycle
//! notifications. This module defines the trait the mediator polls against
//! and the notification payloads it routes, enabling clean separation between
//! mediator logic and the platform SDK binding.

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;
use crate::types::{SocketId, UserId};

// ----------------------------------------------------------------------------
// Inbound Packets
// ----------------------------------------------------------------------------

/// A packet as delivered by the platform transport, before routing.
///
/// Unlike [`Packet`](crate::packet::Packet), this still carries the
/// destination socket; the mediator strips it while sorting the packet into
/// the matching queue.
#[derive(Debug, Clone)]
pub struct InboundPacket {
    /// Raw payload bytes, leading event tag included
    pub payload: Vec<u8>,
    /// Channel the packet was sent on
    pub channel: u8,
    /// Remote account that sent the packet
    pub sender: UserId,
    /// Destination socket descriptor
    pub socket: SocketId,
}

// ----------------------------------------------------------------------------
// Notification Subscriptions
// ----------------------------------------------------------------------------

/// The four connection lifecycle notification kinds the platform emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    ConnectionEstablished,
    ConnectionInterrupted,
    ConnectionClosed,
    ConnectionRequest,
}

impl NotificationKind {
    /// All notification kinds, in subscription order
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::ConnectionEstablished,
        NotificationKind::ConnectionInterrupted,
        NotificationKind::ConnectionClosed,
        NotificationKind::ConnectionRequest,
    ];
}

/// Opaque handle for a registered notification subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Sentinel returned by the platform when a subscription fails
    pub const INVALID: SubscriptionId = SubscriptionId(0);

    /// Create a subscription id from a raw handle value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Check whether this handle refers to a live subscription
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

// ----------------------------------------------------------------------------
// Connection Notifications
// ----------------------------------------------------------------------------

/// Payload of an established / interrupted / closed notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Socket the connection belongs to
    pub socket: SocketId,
    /// Local account the notification is scoped to
    pub local_user: UserId,
    /// Remote account on the other end of the connection
    pub remote_user: UserId,
}

/// An inbound "remote side wants to connect to socket S" request.
///
/// Buffered by the mediator while no peer has claimed the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// Socket the remote side is asking to join
    pub socket: SocketId,
    /// Local account the request was addressed to
    pub local_user: UserId,
    /// Remote account asking to connect
    pub remote_user: UserId,
}

/// Connection lifecycle notifications, delivered synchronously by the host.
///
/// One closed set of variants dispatched through a single mediator entry
/// point; there is no per-kind callback registration to bookkeep on the
/// receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotification {
    /// A connection on some socket finished handshaking
    ConnectionEstablished(ConnectionInfo),
    /// A connection lost contact and is attempting to recover
    ConnectionInterrupted(ConnectionInfo),
    /// The remote side closed a connection
    ConnectionClosed(ConnectionInfo),
    /// A remote side is asking to connect
    ConnectionRequest(ConnectionRequest),
}

impl TransportNotification {
    /// The local account the notification is scoped to
    pub fn local_user(&self) -> &UserId {
        match self {
            Self::ConnectionEstablished(info)
            | Self::ConnectionInterrupted(info)
            | Self::ConnectionClosed(info) => &info.local_user,
            Self::ConnectionRequest(request) => &request.local_user,
        }
    }
}

// ----------------------------------------------------------------------------
// Transport Trait
// ----------------------------------------------------------------------------

/// The single shared platform transport handle.
///
/// Implementations wrap the platform SDK; the mediator only ever drains the
/// handle, it never sends. All calls are non-blocking.
pub trait P2pTransport: Send {
    /// Size in bytes of the next queued packet for the local account, or
    /// `None` when nothing is waiting
    fn next_packet_size(&mut self, local_user: &UserId) -> Result<Option<usize>, TransportError>;

    /// Receive the next queued packet for the local account. `max_size` caps
    /// the payload; a larger actual packet is a [`TransportError::PacketTooLarge`]
    /// invariant violation, not a transient condition.
    fn receive_packet(
        &mut self,
        local_user: &UserId,
        max_size: usize,
    ) -> Result<InboundPacket, TransportError>;

    /// Register for one notification kind, scoped to the local account.
    /// Returns [`SubscriptionId::INVALID`] on failure.
    fn add_notification(&mut self, kind: NotificationKind, local_user: &UserId) -> SubscriptionId;

    /// Remove a previously registered notification subscription
    fn remove_notification(&mut self, kind: NotificationKind, id: SubscriptionId);
}

// ----------------------------------------------------------------------------
// Scripted Transport (for testing)
// ----------------------------------------------------------------------------

/// Scripted transport double: serves a pre-loaded sequence of inbound packets
/// and records subscription traffic.
#[cfg(test)]
pub struct ScriptedTransport {
    queued: std::collections::VecDeque<InboundPacket>,
    next_subscription: u64,
    /// Kinds for which `add_notification` should report failure
    pub failing_kinds: Vec<NotificationKind>,
    /// Live subscriptions, in registration order
    pub subscriptions: Vec<(NotificationKind, SubscriptionId)>,
    /// Subscriptions that have been removed, in removal order
    pub removed: Vec<(NotificationKind, SubscriptionId)>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            queued: std::collections::VecDeque::new(),
            next_subscription: 1,
            failing_kinds: Vec::new(),
            subscriptions: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Queue a packet for the mediator to drain
    pub fn queue_packet(&mut self, socket: &str, sender: &str, channel: u8, payload: Vec<u8>) {
        self.queued.push_back(InboundPacket {
            payload,
            channel,
            sender: UserId::new(sender),
            socket: SocketId::new(socket),
        });
    }

    /// Number of packets still waiting in the transport
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }
}

#[cfg(test)]
impl P2pTransport for ScriptedTransport {
    fn next_packet_size(&mut self, _local_user: &UserId) -> Result<Option<usize>, TransportError> {
        Ok(self.queued.front().map(|packet| packet.payload.len()))
    }

    fn receive_packet(
        &mut self,
        _local_user: &UserId,
        max_size: usize,
    ) -> Result<InboundPacket, TransportError> {
        let packet = self.queued.pop_front().ok_or(TransportError::InvalidParameters)?;
        if packet.payload.len() > max_size {
            return Err(TransportError::PacketTooLarge {
                announced: max_size,
                actual: packet.payload.len(),
            });
        }
        Ok(packet)
    }

    fn add_notification(&mut self, kind: NotificationKind, _local_user: &UserId) -> SubscriptionId {
        if self.failing_kinds.contains(&kind) {
            return SubscriptionId::INVALID;
        }
        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push((kind, id));
        id
    }

    fn remove_notification(&mut self, kind: NotificationKind, id: SubscriptionId) {
        self.subscriptions.retain(|&(k, i)| !(k == kind && i == id));
        self.removed.push((kind, id));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
