//! Mediator configuration

use core::time::Duration;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Mediator Configuration
// ----------------------------------------------------------------------------

/// Configuration for the mediator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Soft cap on the total number of packets queued across all sockets.
    /// Ingestion stops for the tick once the cap is reached; the packet that
    /// crossed it is kept.
    pub queue_size_limit: usize,
    /// How long an unclaimed connection request may stay buffered before it
    /// is dropped. `None` keeps requests until they are claimed or the remote
    /// side closes the connection.
    pub pending_request_expiry: Option<Duration>,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            queue_size_limit: 1024,
            pending_request_expiry: None,
        }
    }
}

impl MediatorConfig {
    /// Config with a small queue cap and aggressive request expiry, for
    /// hosts that would rather shed load than buffer it
    pub fn strict() -> Self {
        Self {
            queue_size_limit: 256,
            pending_request_expiry: Some(Duration::from_secs(10)),
        }
    }

    /// Config with a large queue cap and no request expiry
    pub fn permissive() -> Self {
        Self {
            queue_size_limit: 8192,
            pending_request_expiry: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
