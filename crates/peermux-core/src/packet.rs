//! Inbound packet representation
//!
//! Packets are created by the mediator when it drains the platform transport
//! and handed out unchanged through [`poll_next_packet`]. The mediator never
//! interprets payloads beyond the leading event-type tag, which decides queue
//! placement.
//!
//! [`poll_next_packet`]: crate::mediator::Mediator::poll_next_packet

use serde::{Deserialize, Serialize};

use crate::types::UserId;

// ----------------------------------------------------------------------------
// Wire Constants
// ----------------------------------------------------------------------------

/// Maximum payload size the platform transport will deliver, in bytes
pub const MAX_PACKET_SIZE: usize = 1170;

/// Index of the reserved event-type tag within a packet payload
pub const INDEX_EVENT_TAG: usize = 0;

// ----------------------------------------------------------------------------
// Event Tags
// ----------------------------------------------------------------------------

/// Reserved values of the leading payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventTag {
    /// Ordinary session traffic
    Payload = 0x00,
    /// The sender is announcing its peer identity; such packets jump the queue
    PeerIdentity = 0x01,
}

impl EventTag {
    /// Convert from u8, returning None for unknown values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Payload),
            0x01 => Some(Self::PeerIdentity),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Packet
// ----------------------------------------------------------------------------

/// A single received packet, immutable after construction.
///
/// Holds the raw payload together with the channel it arrived on and the
/// remote account that sent it. The destination socket is not stored here;
/// it is consumed during routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    payload: Vec<u8>,
    channel: u8,
    sender: UserId,
}

impl Packet {
    /// Create a new packet
    pub fn new(payload: Vec<u8>, channel: u8, sender: UserId) -> Self {
        Self {
            payload,
            channel,
            sender,
        }
    }

    /// Get the raw payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the channel the packet arrived on
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Get the sender's user id
    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    /// Get the leading event tag byte, if the payload is non-empty
    pub fn event_tag(&self) -> Option<u8> {
        self.payload.get(INDEX_EVENT_TAG).copied()
    }

    /// Check whether this packet carries a peer-identity announcement
    pub fn is_peer_identity(&self) -> bool {
        self.event_tag() == Some(EventTag::PeerIdentity as u8)
    }

    /// Consume the packet, returning its payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_conversion() {
        assert_eq!(EventTag::from_u8(0x00), Some(EventTag::Payload));
        assert_eq!(EventTag::from_u8(0x01), Some(EventTag::PeerIdentity));
        assert_eq!(EventTag::from_u8(0xFF), None);
    }

    #[test]
    fn test_packet_accessors() {
        let sender = UserId::new("remote-1");
        let packet = Packet::new(vec![0x00, 1, 2, 3], 4, sender.clone());

        assert_eq!(packet.payload(), &[0x00, 1, 2, 3]);
        assert_eq!(packet.channel(), 4);
        assert_eq!(packet.sender(), &sender);
        assert_eq!(packet.event_tag(), Some(0x00));
        assert!(!packet.is_peer_identity());
    }

    #[test]
    fn test_peer_identity_detection() {
        let sender = UserId::new("remote-1");

        let identity = Packet::new(vec![EventTag::PeerIdentity as u8, 9], 0, sender.clone());
        assert!(identity.is_peer_identity());

        // An empty payload has no tag and never jumps the queue
        let empty = Packet::new(Vec::new(), 0, sender);
        assert_eq!(empty.event_tag(), None);
        assert!(!empty.is_peer_identity());
    }
}
