//! Connection settings and lifecycle
//!
//! The core never retries on its own. Callers drive reconnects with
//! [`ConnectionState`] and pace them with a [`Backoff`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport attached
    Disconnected,
    /// Port being opened and module types being sent
    Connecting,
    /// Transport attached and accepting writes
    Connected,
    /// Last write failed; the transport is still attached but likely dead
    Error,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Write timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ConnectionConfig {
    /// Config for `port_name` with default baud rate and timeout
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }
}

/// Exponential reconnect delay, capped after a fixed number of doublings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    /// Delay before the first retry, in milliseconds
    pub base_ms: u64,
    /// How many times the delay may double
    pub max_doublings: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        // 5 s, 10 s, 20 s, 20 s, ...
        Self {
            base_ms: 5000,
            max_doublings: 2,
        }
    }
}

impl Backoff {
    /// Delay to wait after `attempt` consecutive failed attempts
    pub fn delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.min(self.max_doublings).min(31);
        Duration::from_millis(self.base_ms.saturating_mul(1u64 << doublings))
    }
}
