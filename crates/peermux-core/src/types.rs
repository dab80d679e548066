//! Core types for the peermux mediator
//!
//! This module defines the fundamental identifiers used throughout the crate,
//! using newtype patterns for semantic validation and type safety.

use core::fmt;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Socket Identifier
// ----------------------------------------------------------------------------

/// String key identifying one logical communication endpoint.
///
/// Multiple sockets multiplex independent session traffic over the single
/// shared platform transport handle. A socket id is unique among currently
/// active peers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketId(String);

impl SocketId {
    /// Create a new socket id
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    /// Get the socket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the socket name is empty (an inactive peer reports this)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SocketId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SocketId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ----------------------------------------------------------------------------
// User Identifier
// ----------------------------------------------------------------------------

/// Opaque account identifier issued by the platform's identity service.
///
/// Used both for the local logged-in account and for remote packet senders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user id
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the raw id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ----------------------------------------------------------------------------
// Login Status
// ----------------------------------------------------------------------------

/// Login state reported by the platform identity provider.
///
/// The mediator only operates while the local account is `LoggedIn`; any
/// transition away from it terminates the mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginStatus {
    /// Account is fully logged in
    LoggedIn,
    /// Account is usable locally but not authenticated online
    UsingLocalProfile,
    /// Account is not logged in
    NotLoggedIn,
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Millisecond timestamp since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get current wall-clock timestamp
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    /// Get the raw milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get duration since another timestamp (saturating)
    pub fn duration_since(&self, other: Self) -> core::time::Duration {
        core::time::Duration::from_millis(self.0.saturating_sub(other.0))
    }
}

// ----------------------------------------------------------------------------
// Time Source Trait
// ----------------------------------------------------------------------------

/// Trait for providing timestamps.
///
/// Keeps time-dependent behavior (pending-request expiry) deterministic in
/// tests by allowing a manual clock to be injected.
pub trait TimeSource: Send {
    /// Get the current timestamp
    fn now(&self) -> Timestamp;
}

/// Standard wall-clock implementation of [`TimeSource`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_id() {
        let socket = SocketId::new("game");
        assert_eq!(socket.as_str(), "game");
        assert!(!socket.is_empty());
        assert_eq!(socket, SocketId::from("game"));
        assert_eq!(socket.to_string(), "game");

        assert!(SocketId::new("").is_empty());
    }

    #[test]
    fn test_user_id() {
        let user = UserId::new("0002abcdef");
        assert_eq!(user.as_str(), "0002abcdef");
        assert_eq!(user, UserId::from("0002abcdef"));
        assert_ne!(user, UserId::new("0002fedcba"));
    }

    #[test]
    fn test_timestamp_duration_since() {
        let earlier = Timestamp::new(1_000);
        let later = Timestamp::new(3_500);

        assert_eq!(later.duration_since(earlier).as_millis(), 2_500);
        // Saturates instead of underflowing
        assert_eq!(earlier.duration_since(later).as_millis(), 0);
    }
}
