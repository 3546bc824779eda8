//! Async TCP driver for the hot-reload session.
//!
//! [`DevClient::spawn`] starts a background task that dials the dev server,
//! feeds every socket outcome through the [`ReloadMachine`], and executes the
//! actions it hands back: writing pongs, sleeping out retry delays, and
//! forwarding [`ReloadEvent`]s to the host. The task owns the socket; the
//! host keeps a cheap [`ReloadHandle`] for state snapshots and shutdown.

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::protocol::{ClientFrame, ServerFrame};
use super::state::{ReloadAction, ReloadEvent, ReloadMachine, ReloadState};
use crate::config::ReloadConfig;
use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// DevClient / ReloadHandle
// ---------------------------------------------------------------------------

/// Hot-reload client for a dev server.
pub struct DevClient;

impl DevClient {
    /// Spawn the driver task and start connecting.
    ///
    /// Returns a control handle and the stream of session events. Must be
    /// called from within a Tokio runtime.
    pub fn spawn(config: ReloadConfig) -> (ReloadHandle, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ReloadState::Disconnected);
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            machine: ReloadMachine::new(config.max_attempts),
            config,
            events: event_tx,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        tokio::spawn(driver.run());
        (
            ReloadHandle {
                state: state_rx,
                shutdown: shutdown_tx,
            },
            event_rx,
        )
    }
}

/// Host-side control for a spawned [`DevClient`].
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    state: watch::Receiver<ReloadState>,
    shutdown: mpsc::UnboundedSender<()>,
}

impl ReloadHandle {
    /// Snapshot of the session state.
    pub fn state(&self) -> ReloadState {
        *self.state.borrow()
    }

    /// Ask the driver to stop. Safe to call after it already has.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Whether the driver task has stopped.
    pub fn is_finished(&self) -> bool {
        self.shutdown.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

struct Driver {
    config: ReloadConfig,
    machine: ReloadMachine,
    events: mpsc::UnboundedSender<ReloadEvent>,
    state: watch::Sender<ReloadState>,
    shutdown: mpsc::UnboundedReceiver<()>,
}

impl Driver {
    async fn run(mut self) {
        let mut queue: VecDeque<ReloadAction> = self.machine.start().into();
        self.publish();
        while let Some(action) = queue.pop_front() {
            match action {
                ReloadAction::Emit(event) => self.emit(event),
                ReloadAction::StartConnect => match self.connect().await {
                    Some(actions) => queue.extend(actions),
                    None => break,
                },
                ReloadAction::ScheduleRetry => {
                    debug!(delay = ?self.config.retry_delay, "waiting to reconnect");
                    tokio::select! {
                        _ = sleep(self.config.retry_delay) => {
                            queue.extend(self.machine.retry_elapsed());
                        }
                        _ = self.shutdown.recv() => break,
                    }
                }
                // Pongs only arise inside an open socket.
                ReloadAction::SendPong => {}
            }
            self.publish();
        }
        self.publish();
        debug!("reload driver stopped");
    }

    /// Dial the server and run the session until the socket ends.
    ///
    /// Returns the follow-up actions, or `None` on shutdown.
    async fn connect(&mut self) -> Option<Vec<ReloadAction>> {
        info!(addr = %self.config.addr, "connecting to dev server");
        let stream = tokio::select! {
            result = TcpStream::connect(&self.config.addr) => match result {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(addr = %self.config.addr, %err, "dev server connect failed");
                    return Some(self.machine.connection_lost());
                }
            },
            _ = self.shutdown.recv() => return None,
        };
        debug!(addr = %self.config.addr, "dev server socket open");

        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.handle_line(&line, &mut write_half).await {
                            return Some(self.machine.connection_lost());
                        }
                    }
                    Ok(None) => {
                        debug!(err = %BridgeError::ConnectionLost, "dev server closed the stream");
                        return Some(self.machine.connection_lost());
                    }
                    Err(err) => {
                        warn!(%err, "dev server read failed");
                        return Some(self.machine.connection_lost());
                    }
                },
                _ = self.shutdown.recv() => return None,
            }
        }
    }

    /// Feed one line through the machine. Returns false if the socket died.
    async fn handle_line(&mut self, line: &str, write_half: &mut OwnedWriteHalf) -> bool {
        let frame = match ServerFrame::parse(line) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "ignoring malformed dev server frame");
                return true;
            }
        };
        let actions = self.machine.frame(frame);
        // Publish the state before the host can observe the event for it.
        self.publish();
        for action in actions {
            match action {
                ReloadAction::SendPong => {
                    let pong = ClientFrame::Pong.to_line();
                    if let Err(err) = write_half.write_all(pong.as_bytes()).await {
                        warn!(%err, "dev server write failed");
                        return false;
                    }
                }
                ReloadAction::Emit(event) => self.emit(event),
                // Frames never ask for connects or timers.
                ReloadAction::StartConnect | ReloadAction::ScheduleRetry => {}
            }
        }
        true
    }

    fn emit(&self, event: ReloadEvent) {
        if self.events.send(event).is_err() {
            debug!("reload event receiver dropped");
        }
    }

    fn publish(&self) {
        self.state.send_replace(self.machine.state());
    }
}

// ===========================================================================
// Tests
// ===========================================================================
