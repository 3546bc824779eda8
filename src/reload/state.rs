//! Reconnect state machine for the hot-reload session.
//!
//! [`ReloadMachine`] is pure: the TCP driver feeds it what happened (socket
//! opened, frame arrived, connection lost, retry timer elapsed) and executes
//! the [`ReloadAction`]s it returns. Keeping the policy out of the I/O loop
//! means the retry budget and handshake rules are testable without a socket.

use tracing::{debug, info, warn};

use super::protocol::ServerFrame;

// ---------------------------------------------------------------------------
// States, events, actions
// ---------------------------------------------------------------------------

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// No session and none being attempted.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    /// Handshake complete; bundles and pings flow.
    Connected,
    /// Session lost; retrying on a fixed delay.
    Reconnecting,
}

/// What the host observes from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The dev server acknowledged the session.
    Connected,
    /// A new bundle arrived and should replace the running one.
    Bundle(String),
    /// The retry budget is exhausted; the session is over.
    GaveUp,
}

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadAction {
    /// Open a TCP connection to the dev server.
    StartConnect,
    /// Answer the server's ping.
    SendPong,
    /// Forward an event to the host.
    Emit(ReloadEvent),
    /// Wait out the retry delay, then report `retry_elapsed`.
    ScheduleRetry,
}

// ---------------------------------------------------------------------------
// ReloadMachine
// ---------------------------------------------------------------------------

/// Pure session policy: handshake, retry budget, give-up.
#[derive(Debug)]
pub struct ReloadMachine {
    state: ReloadState,
    max_attempts: u32,
    /// Failed connection attempts since the last live session.
    attempts: u32,
}

impl ReloadMachine {
    /// Create a machine that tolerates `max_attempts` consecutive failures.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ReloadState::Disconnected,
            max_attempts,
            attempts: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// Failed attempts in the current outage.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Kick off the first connection. No-op unless disconnected.
    pub fn start(&mut self) -> Vec<ReloadAction> {
        if self.state != ReloadState::Disconnected {
            debug!(state = ?self.state, "reload session already running");
            return Vec::new();
        }
        self.transition(ReloadState::Connecting);
        vec![ReloadAction::StartConnect]
    }

    /// A frame arrived on the open socket.
    pub fn frame(&mut self, frame: ServerFrame) -> Vec<ReloadAction> {
        match frame {
            ServerFrame::Connected => {
                if self.state == ReloadState::Connected {
                    debug!("duplicate connected frame ignored");
                    return Vec::new();
                }
                self.attempts = 0;
                self.transition(ReloadState::Connected);
                vec![ReloadAction::Emit(ReloadEvent::Connected)]
            }
            ServerFrame::Bundle { bundle } => {
                if self.state != ReloadState::Connected {
                    warn!(state = ?self.state, "bundle before handshake ignored");
                    return Vec::new();
                }
                info!(bytes = bundle.len(), "bundle received");
                vec![ReloadAction::Emit(ReloadEvent::Bundle(bundle))]
            }
            // Pings are answered whenever a socket is up, handshake or not.
            ServerFrame::Ping => vec![ReloadAction::SendPong],
        }
    }

    /// The connection attempt failed or an open socket dropped.
    pub fn connection_lost(&mut self) -> Vec<ReloadAction> {
        match self.state {
            ReloadState::Disconnected => Vec::new(),
            ReloadState::Connected => {
                // Losing a live session starts a fresh retry budget.
                self.attempts = 0;
                self.transition(ReloadState::Reconnecting);
                vec![ReloadAction::ScheduleRetry]
            }
            ReloadState::Connecting | ReloadState::Reconnecting => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    warn!(attempts = self.attempts, "dev server unreachable, giving up");
                    self.transition(ReloadState::Disconnected);
                    vec![ReloadAction::Emit(ReloadEvent::GaveUp)]
                } else {
                    self.transition(ReloadState::Reconnecting);
                    vec![ReloadAction::ScheduleRetry]
                }
            }
        }
    }

    /// The retry delay elapsed.
    pub fn retry_elapsed(&mut self) -> Vec<ReloadAction> {
        if self.state != ReloadState::Reconnecting {
            debug!(state = ?self.state, "stale retry timer ignored");
            return Vec::new();
        }
        vec![ReloadAction::StartConnect]
    }

    fn transition(&mut self, next: ReloadState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "reload session state");
            self.state = next;
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
