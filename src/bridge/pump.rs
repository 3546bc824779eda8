//! The two-context seam: a cloneable logic-side handle and the
//! presentation-side pump that owns the session.
//!
//! Everything crossing the channel is plain data; per-sender FIFO order is
//! the delivery guarantee. The pump never spawns tasks, so a session holding
//! thread-affine native views can run on a current-thread runtime or inside
//! a `LocalSet`.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::event::EventRecord;
use crate::geometry::Size;
use crate::module::ModuleReply;
use crate::op::{NodeHandle, OpBatch};

use super::session::BridgeSession;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum BridgeCommand {
    Batch(OpBatch),
    Wire(String),
    Invoke {
        module: String,
        method: String,
        args: Vec<Value>,
        reply: oneshot::Sender<ModuleReply>,
    },
    NativeEvent {
        handle: NodeHandle,
        event: String,
        payload: Value,
    },
    SetViewport(Size),
    Reset,
    Shutdown,
}

/// Wire a session to a channel pair: the cloneable [`BridgeHandle`] for the
/// logic side, the [`BridgePump`] for the presentation side, and the stream
/// of outbound [`EventRecord`]s.
pub fn bridge_channel(
    session: BridgeSession,
) -> (BridgeHandle, BridgePump, mpsc::UnboundedReceiver<EventRecord>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        BridgeHandle { tx: command_tx },
        BridgePump {
            session,
            commands: command_rx,
            events: event_tx,
        },
        event_rx,
    )
}

// ---------------------------------------------------------------------------
// BridgeHandle
// ---------------------------------------------------------------------------

/// Logic-side entry point. Cheap to clone and safe to send across threads;
/// all methods are fire-and-forget except [`BridgeHandle::invoke`], which
/// returns the reply channel. Commands sent after the pump stopped are
/// dropped with a warning.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::UnboundedSender<BridgeCommand>,
}

impl BridgeHandle {
    /// Queue a batch for application.
    pub fn submit(&self, batch: OpBatch) {
        self.send(BridgeCommand::Batch(batch));
    }

    /// Queue a JSON wire batch for decoding and application.
    pub fn submit_wire(&self, payload: impl Into<String>) {
        self.send(BridgeCommand::Wire(payload.into()));
    }

    /// Call a native module. The receiver always yields exactly one reply,
    /// even when the pump is already gone.
    pub fn invoke(
        &self,
        module: &str,
        method: &str,
        args: Vec<Value>,
    ) -> oneshot::Receiver<ModuleReply> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Invoke {
            module: module.to_string(),
            method: method.to_string(),
            args,
            reply,
        };
        if let Err(mpsc::error::SendError(command)) = self.tx.send(command) {
            warn!("bridge command dropped, pump is gone");
            if let BridgeCommand::Invoke { reply, .. } = command {
                let _ = reply.send(Err("bridge is closed".to_string()));
            }
        }
        rx
    }

    /// Forward a native event, for backends that hold a handle clone
    /// instead of the session.
    pub fn native_event(&self, handle: NodeHandle, event: &str, payload: Value) {
        self.send(BridgeCommand::NativeEvent {
            handle,
            event: event.to_string(),
            payload,
        });
    }

    /// Report a new viewport size.
    pub fn set_viewport(&self, viewport: Size) {
        self.send(BridgeCommand::SetViewport(viewport));
    }

    /// Tear down all views and listeners, keeping factories and modules.
    pub fn reset(&self) {
        self.send(BridgeCommand::Reset);
    }

    /// Stop the pump after it drains commands queued so far.
    pub fn shutdown(&self) {
        self.send(BridgeCommand::Shutdown);
    }

    /// Whether the pump has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: BridgeCommand) {
        if self.tx.send(command).is_err() {
            warn!("bridge command dropped, pump is gone");
        }
    }
}

// ---------------------------------------------------------------------------
// BridgePump
// ---------------------------------------------------------------------------

/// Presentation-side driver. Owns the [`BridgeSession`] and multiplexes the
/// command stream with the session's throttle timer.
pub struct BridgePump {
    session: BridgeSession,
    commands: mpsc::UnboundedReceiver<BridgeCommand>,
    events: mpsc::UnboundedSender<EventRecord>,
}

impl BridgePump {
    /// The owned session.
    pub fn session(&self) -> &BridgeSession {
        &self.session
    }

    /// Mutable access to the owned session, for hosts that install
    /// factories or modules after wiring the channel.
    pub fn session_mut(&mut self) -> &mut BridgeSession {
        &mut self.session
    }

    /// Drive the session until shutdown (or every handle is dropped),
    /// then return it to the host.
    pub async fn run(mut self) -> BridgeSession {
        loop {
            let deadline = self.session.next_timer();
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                    self.session.flush_due_events(Instant::now());
                }
            }
            self.forward_events();
        }
        self.forward_events();
        debug!("bridge pump stopped");
        self.session
    }

    /// Drain queued commands and due trailing fires without awaiting, for
    /// hosts embedding their own loop. `now` feeds the throttle clock.
    pub fn pump_now(&mut self, now: Instant) {
        while let Ok(command) = self.commands.try_recv() {
            if !self.handle_command(command) {
                break;
            }
        }
        self.session.flush_due_events(now);
        self.forward_events();
    }

    /// Apply one command. Returns `false` on shutdown.
    fn handle_command(&mut self, command: BridgeCommand) -> bool {
        match command {
            BridgeCommand::Batch(batch) => {
                self.session.apply_batch(batch);
            }
            BridgeCommand::Wire(payload) => {
                if let Err(err) = self.session.apply_wire(&payload) {
                    warn!(%err, "dropping wire batch");
                }
            }
            BridgeCommand::Invoke { module, method, args, reply } => {
                self.session.invoke_with(&module, &method, args, reply);
            }
            BridgeCommand::NativeEvent { handle, event, payload } => {
                self.session
                    .dispatch_native_event(handle, &event, payload, Instant::now());
            }
            BridgeCommand::SetViewport(viewport) => self.session.set_viewport(viewport),
            BridgeCommand::Reset => self.session.reset(),
            BridgeCommand::Shutdown => return false,
        }
        true
    }

    fn forward_events(&mut self) {
        for record in self.session.take_outbound() {
            if self.events.send(record).is_err() {
                debug!("event receiver gone, dropping outbound events");
                break;
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
