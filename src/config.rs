//! Bridge and dev-server configuration.
//!
//! [`BridgeConfig`] is built once by the host and handed to the session. The
//! viewport can also be updated live through the session once the platform
//! reports a real size. [`ReloadConfig`] points the hot-reload client at a
//! dev server and bounds its reconnect behavior.

use std::collections::HashSet;
use std::time::Duration;

use crate::geometry::Size;

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Configuration for a bridge session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Initial viewport size for layout, in device pixels.
    pub viewport: Size,
    /// Minimum interval between deliveries of a throttled event stream.
    pub throttle_interval: Duration,
    /// Event names that go through the trailing-edge throttle.
    pub throttled_events: HashSet<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            viewport: Size::ZERO,
            throttle_interval: Duration::from_millis(16),
            throttled_events: ["scroll", "pan", "drag"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl BridgeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial viewport (builder).
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the throttle window (builder).
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// Mark an event name as throttled (builder).
    pub fn with_throttled_event(mut self, event: impl Into<String>) -> Self {
        self.throttled_events.insert(event.into());
        self
    }

    /// Remove an event name from the throttled set (builder).
    pub fn without_throttled_event(mut self, event: &str) -> Self {
        self.throttled_events.remove(event);
        self
    }

    /// Whether `event` streams through the throttle.
    pub fn is_throttled(&self, event: &str) -> bool {
        self.throttled_events.contains(event)
    }
}

// ---------------------------------------------------------------------------
// ReloadConfig
// ---------------------------------------------------------------------------

/// Configuration for the hot-reload dev-server client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadConfig {
    /// Dev server address, e.g. `"127.0.0.1:8081"`.
    pub addr: String,
    /// Consecutive failed connection attempts tolerated before giving up.
    pub max_attempts: u32,
    /// Fixed delay between reconnect attempts.
    pub retry_delay: Duration,
}

impl ReloadConfig {
    /// Create a config pointing at `addr` with default retry behavior.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
        }
    }

    /// Set the reconnect attempt budget (builder).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between reconnect attempts (builder).
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
