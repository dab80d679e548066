//! Error types for the peermux mediator
//!
//! Two error classes are modeled explicitly: transport invariant violations
//! reported by the platform layer, and programmer misuse of the mediator's
//! own API. Benign routing misses (traffic for a socket nobody registered)
//! are not errors and never appear here.

use crate::transport::NotificationKind;
use crate::types::SocketId;

// ----------------------------------------------------------------------------
// Transport Errors
// ----------------------------------------------------------------------------

/// Fatal error classes reported by the platform transport.
///
/// None of these are transient: each indicates either incorrect usage of the
/// platform API or an internal inconsistency in the platform layer. The
/// mediator aborts the current tick and retries from scratch on the next one.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid parameters passed to the platform transport")]
    InvalidParameters,
    #[error("received packet exceeds the announced size (got {actual}, announced {announced})")]
    PacketTooLarge { announced: usize, actual: usize },
    #[error("failed to subscribe to {kind:?} notifications")]
    SubscriptionFailed { kind: NotificationKind },
}

// ----------------------------------------------------------------------------
// Mediator Errors
// ----------------------------------------------------------------------------

/// Errors returned by mediator operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MediatorError {
    #[error("mediator has not been initialized; initialize it before starting a session")]
    NotInitialized,

    #[error("peer is not active and reports no socket")]
    PeerNotActive,

    #[error("socket \"{0}\" is already registered")]
    SocketAlreadyRegistered(SocketId),

    #[error("socket \"{0}\" is not registered")]
    SocketNotRegistered(SocketId),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, MediatorError>;

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
