//! Peermux Core
//!
//! This crate mediates peer-to-peer traffic for multiplayer sessions built on
//! a platform networking service. Multiple independent session instances may
//! be active in one process, each owning a uniquely named socket, while all
//! inbound traffic and connection notifications arrive through a single
//! shared transport handle. The [`Mediator`] demultiplexes that stream into
//! per-socket packet queues, forwards connection lifecycle notifications to
//! the owning peer, and buffers connection requests that arrive before their
//! target socket has been opened locally.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod errors;
pub mod mediator;
pub mod packet;
pub mod peer;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::MediatorConfig;
pub use errors::{MediatorError, Result, TransportError};
pub use mediator::{Mediator, MediatorEvent, MediatorEventHandler};
pub use packet::{EventTag, Packet, MAX_PACKET_SIZE};
pub use peer::SessionPeer;
pub use transport::{
    ConnectionInfo, ConnectionRequest, InboundPacket, NotificationKind, P2pTransport,
    SubscriptionId, TransportNotification,
};
pub use types::{LoginStatus, SocketId, SystemTimeSource, TimeSource, Timestamp, UserId};
