//! Trailing-edge throttle for high-frequency event streams.
//!
//! One [`ThrottleGate`] per (view, event) stream. The first event after an
//! idle period passes immediately; events landing inside the window are
//! coalesced and only the latest payload fires when the window closes (the
//! trailing edge). Cancelling discards whatever is pending.
//!
//! The gate is clock-injected: callers pass `now` and schedule the trailing
//! fire from [`ThrottleGate::next_deadline`]. Instants are tokio's so the
//! async pump can sleep on them and paused-clock tests stay deterministic.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Per-stream throttle state.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    /// When the stream last delivered (leading or trailing).
    last_fire: Option<Instant>,
    /// Latest coalesced payload waiting for the trailing edge.
    pending: Option<Value>,
}

impl ThrottleGate {
    /// Create a gate with the given minimum delivery interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_fire: None, pending: None }
    }

    /// Offer an event. Returns the payload to deliver right now (the leading
    /// edge), or `None` if it was coalesced for the trailing edge.
    ///
    /// Callers flush [`ThrottleGate::poll`] before offering so an overdue
    /// trailing payload is never reordered behind a fresh leading fire.
    pub fn offer(&mut self, now: Instant, payload: Value) -> Option<Value> {
        match self.last_fire {
            Some(last) if now < last + self.interval => {
                self.pending = Some(payload);
                None
            }
            _ => {
                self.last_fire = Some(now);
                Some(payload)
            }
        }
    }

    /// Fire the trailing edge if its deadline has passed. The fire is
    /// stamped at the deadline itself, so the next window stays aligned to
    /// the stream rather than to polling jitter.
    pub fn poll(&mut self, now: Instant) -> Option<Value> {
        let last = self.last_fire?;
        if self.pending.is_some() && now >= last + self.interval {
            self.last_fire = Some(last + self.interval);
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending trailing fire is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.pending.is_some() {
            self.last_fire.map(|last| last + self.interval)
        } else {
            None
        }
    }

    /// Discard any pending trailing fire.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a trailing fire is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
