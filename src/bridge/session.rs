//! The presentation-side session: applies operation batches to live views.
//!
//! [`BridgeSession`] owns every side table (factories, views, layout tree,
//! listeners, modules) and is the single writer for all of them. Batches
//! apply atomically in arrival order; an op that fails is skipped with a
//! warning and never aborts the rest of its batch. Layout runs at most once
//! per batch, after all ops, and only when something layout-relevant moved.

use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::event::{EventDispatcher, EventRecord};
use crate::geometry::Size;
use crate::layout::LayoutEngine;
use crate::module::{ModuleRegistry, ModuleReply, NativeModule};
use crate::op::wire;
use crate::op::{NodeHandle, Op, OpBatch};
use crate::registry::{
    FactoryRegistry, NativeView, ViewEntry, ViewFactory, ViewRegistry, TEXT_PROP, TEXT_TAG,
};

// ---------------------------------------------------------------------------
// BatchSummary
// ---------------------------------------------------------------------------

/// What happened while applying one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Sequence number of the batch.
    pub seq: u64,
    /// Ops applied successfully.
    pub applied: usize,
    /// Ops skipped after a recoverable error.
    pub skipped: usize,
    /// Whether a layout pass ran for this batch.
    pub layout_ran: bool,
}

// ---------------------------------------------------------------------------
// BridgeSession
// ---------------------------------------------------------------------------

/// Owns the native side of the bridge.
///
/// Hosts construct a session, install their view factories and native
/// modules, then feed it batches (directly or through the pump). The
/// session never spawns tasks and never blocks; timing comes in through
/// `now: Instant` parameters so behavior is deterministic under test.
pub struct BridgeSession {
    config: BridgeConfig,
    factories: FactoryRegistry,
    views: ViewRegistry,
    layout: LayoutEngine,
    events: EventDispatcher,
    modules: ModuleRegistry,
    viewport: Size,
    wire_seq: u64,
}

impl BridgeSession {
    /// Create a session with no factories or modules installed.
    pub fn new(config: BridgeConfig) -> Self {
        let viewport = config.viewport;
        Self {
            config,
            factories: FactoryRegistry::new(),
            views: ViewRegistry::new(),
            layout: LayoutEngine::new(),
            events: EventDispatcher::new(),
            modules: ModuleRegistry::new(),
            viewport,
            wire_seq: 0,
        }
    }

    /// Register a view factory for a type tag. Last registration wins.
    pub fn register_factory(&mut self, tag: impl Into<String>, factory: Rc<dyn ViewFactory>) {
        self.factories.register(tag, factory);
    }

    /// Mutable access to the factory table, for backends that install a
    /// whole family of factories at once.
    pub fn factories_mut(&mut self) -> &mut FactoryRegistry {
        &mut self.factories
    }

    /// Register a native module under its own name. Last registration wins.
    pub fn register_module(&mut self, module: Rc<dyn NativeModule>) {
        self.modules.register(module);
    }

    /// The live-view table.
    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// The session configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current viewport in device pixels.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// How many layout passes have run.
    pub fn layout_passes(&self) -> u64 {
        self.layout.passes()
    }

    // -----------------------------------------------------------------------
    // Batch application
    // -----------------------------------------------------------------------

    /// Apply one batch. Ops run in order; a failing op is skipped with a
    /// `warn!` and the rest of the batch still applies. Subtrees left
    /// detached at the end of the batch are destroyed, children first.
    pub fn apply_batch(&mut self, batch: OpBatch) -> BatchSummary {
        let seq = batch.seq;
        let mut applied = 0usize;
        let mut skipped = 0usize;
        let mut dirty = false;
        let mut detached: BTreeSet<NodeHandle> = BTreeSet::new();

        for op in batch.ops {
            let name = op.wire_name();
            match self.apply_op(op, &mut dirty, &mut detached) {
                Ok(()) => applied += 1,
                Err(err) => {
                    skipped += 1;
                    warn!(op = name, %err, "skipping op");
                }
            }
        }

        // Anything detached and not re-inserted by now is gone for good.
        for candidate in detached {
            if self.views.parent(candidate).is_some() || self.views.root() == Some(candidate) {
                continue;
            }
            self.destroy_subtree(candidate);
        }

        let layout_ran = dirty && self.views.root().is_some();
        if dirty {
            self.run_layout();
        }

        debug!(seq, applied, skipped, layout = layout_ran, "batch applied");
        BatchSummary { seq, applied, skipped, layout_ran }
    }

    /// Decode and apply a JSON wire batch. Malformed elements are skipped
    /// individually; only a non-array payload fails the whole call.
    pub fn apply_wire(&mut self, payload: &str) -> Result<BatchSummary, BridgeError> {
        let elements = wire::decode_batch_str(payload)?;
        let mut ops = Vec::with_capacity(elements.len());
        let mut malformed = 0usize;
        for element in elements {
            match element {
                Ok(op) => ops.push(op),
                Err(err) => {
                    malformed += 1;
                    warn!(%err, "skipping malformed op");
                }
            }
        }

        self.wire_seq += 1;
        let mut summary = self.apply_batch(OpBatch::new(self.wire_seq, ops));
        summary.skipped += malformed;
        Ok(summary)
    }

    fn apply_op(
        &mut self,
        op: Op,
        dirty: &mut bool,
        detached: &mut BTreeSet<NodeHandle>,
    ) -> Result<(), BridgeError> {
        match op {
            Op::Create { handle, tag } => {
                if self.views.contains(handle) {
                    return Err(BridgeError::DuplicateHandle(handle));
                }
                let factory = self
                    .factories
                    .get(&tag)
                    .ok_or_else(|| BridgeError::MissingFactory(tag.clone()))?;
                let view = factory.create(&tag, handle);
                self.views.insert(ViewEntry::new(handle, tag, view, factory))
            }

            Op::CreateText { handle, text } => {
                if self.views.contains(handle) {
                    return Err(BridgeError::DuplicateHandle(handle));
                }
                let factory = self
                    .factories
                    .get(TEXT_TAG)
                    .ok_or_else(|| BridgeError::MissingFactory(TEXT_TAG.to_string()))?;
                let view = factory.create(TEXT_TAG, handle);
                self.views.insert(ViewEntry::new(handle, TEXT_TAG, view, factory))?;
                self.push_prop(handle, TEXT_PROP, Some(&Value::String(text)))
            }

            Op::Insert { parent, child, before } => {
                let old_parent = self.views.parent(child);
                self.views.attach(parent, child, before)?;
                if let Some(old) = old_parent {
                    self.native_pair(old, child, |factory, p, c| factory.remove_child(p, c))?;
                }
                self.native_pair(parent, child, |factory, p, c| {
                    factory.insert_child(p, c, before)
                })?;
                // Re-inserting within the batch is a move, not a destroy.
                detached.remove(&child);
                *dirty = true;
                Ok(())
            }

            Op::Remove { parent, child } => {
                if self.views.detach(parent, child)? {
                    self.native_pair(parent, child, |factory, p, c| factory.remove_child(p, c))?;
                    detached.insert(child);
                    *dirty = true;
                } else {
                    debug!(%parent, %child, "child not attached to parent");
                }
                Ok(())
            }

            Op::UpdateProp { handle, key, value } => {
                self.push_prop(handle, &key, value.as_ref())
            }

            Op::UpdateStyle { handle, style } => {
                let delta = self.views.entry_mut(handle)?.style.merge(&style);
                if delta.layout_changed {
                    *dirty = true;
                }
                for (key, value) in &delta.paint {
                    self.push_prop(handle, key, value.as_ref())?;
                }
                Ok(())
            }

            Op::AddListener { handle, event } => {
                let entry = self.views.entry_mut(handle)?;
                if !self.events.has_listener(handle, &event) {
                    let factory = Rc::clone(&entry.factory);
                    factory.add_listener(entry.view.as_mut(), &event);
                    let throttle = self
                        .config
                        .is_throttled(&event)
                        .then(|| self.config.throttle_interval);
                    self.events.add_listener(handle, &event, throttle);
                }
                Ok(())
            }

            Op::RemoveListener { handle, event } => {
                let entry = self.views.entry_mut(handle)?;
                if self.events.remove_listener(handle, &event) {
                    let factory = Rc::clone(&entry.factory);
                    factory.remove_listener(entry.view.as_mut(), &event);
                } else {
                    debug!(%handle, event, "listener already absent");
                }
                Ok(())
            }

            Op::SetRoot { handle } => {
                let before = self.views.root();
                self.views.set_root(handle)?;
                if before != self.views.root() {
                    *dirty = true;
                }
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Ingest a native event from a backend. Returns `false` when it was
    /// dropped for lack of a listener.
    pub fn dispatch_native_event(
        &mut self,
        handle: NodeHandle,
        event: &str,
        payload: Value,
        now: Instant,
    ) -> bool {
        self.events.dispatch(handle, event, payload, now)
    }

    /// Fire throttled trailing edges whose deadline has passed.
    pub fn flush_due_events(&mut self, now: Instant) {
        self.events.poll(now);
    }

    /// Earliest pending throttle deadline, for the pump's timer.
    pub fn next_timer(&self) -> Option<Instant> {
        self.events.next_deadline()
    }

    /// Drain queued outbound events in dispatch order.
    pub fn take_outbound(&mut self) -> Vec<EventRecord> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Native module RPC
    // -----------------------------------------------------------------------

    /// Start an asynchronous module call. The receiver always yields exactly
    /// one reply.
    pub fn invoke(
        &mut self,
        module: &str,
        method: &str,
        args: Vec<Value>,
    ) -> oneshot::Receiver<ModuleReply> {
        self.modules.invoke(module, method, args)
    }

    /// Start an asynchronous module call resolving into a caller-supplied
    /// channel. The pump uses this to hand the logic side's receiver
    /// straight to the module.
    pub fn invoke_with(
        &mut self,
        module: &str,
        method: &str,
        args: Vec<Value>,
        reply: oneshot::Sender<ModuleReply>,
    ) {
        self.modules.invoke_with(module, method, args, reply);
    }

    /// Call a module synchronously.
    pub fn invoke_sync(&mut self, module: &str, method: &str, args: Vec<Value>) -> ModuleReply {
        self.modules.invoke_sync(module, method, args)
    }

    // -----------------------------------------------------------------------
    // Host controls
    // -----------------------------------------------------------------------

    /// Report a new viewport size. Relayouts immediately when a root is
    /// mounted.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        if self.views.root().is_some() {
            self.run_layout();
        }
    }

    /// Tear down every view (children first), all listeners, and all pending
    /// throttle fires. Factories, modules, and the viewport survive. Used
    /// when a fresh bundle replaces the running one.
    pub fn reset(&mut self) {
        let drained = self.views.drain_post_order();
        debug!(count = drained.len(), "session reset, destroying all views");
        drop(drained);
        self.events.clear();
        self.layout.sync(&self.views);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Forward a prop update (or clear) to the view's factory.
    fn push_prop(
        &mut self,
        handle: NodeHandle,
        key: &str,
        value: Option<&Value>,
    ) -> Result<(), BridgeError> {
        let entry = self.views.entry_mut(handle)?;
        let factory = Rc::clone(&entry.factory);
        factory.update_prop(entry.view.as_mut(), key, value);
        Ok(())
    }

    /// Run a factory call that needs the parent view mutable and the child
    /// view shared. The parent's factory performs containment changes.
    fn native_pair(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        f: impl FnOnce(&Rc<dyn ViewFactory>, &mut dyn NativeView, &dyn NativeView),
    ) -> Result<(), BridgeError> {
        self.views.with_pair(parent, child, |parent_entry, child_entry| {
            let factory = Rc::clone(&parent_entry.factory);
            f(&factory, parent_entry.view.as_mut(), child_entry.view.as_ref());
        })
    }

    /// Destroy `top` and its whole subtree, children before parents.
    /// Listener state and pending throttle fires go with each view.
    fn destroy_subtree(&mut self, top: NodeHandle) {
        for handle in self.views.post_order(top) {
            self.events.remove_view(handle);
            // Dropping the entry releases the native view.
            self.views.remove(handle);
        }
    }

    /// Sync the layout tree, compute, and push changed frames to views.
    fn run_layout(&mut self) {
        self.layout.sync(&self.views);
        self.layout.compute(self.viewport);
        for (handle, frame) in self.layout.frames(&self.views) {
            let Some(entry) = self.views.get_mut(handle) else {
                continue;
            };
            if entry.last_frame == Some(frame) {
                continue;
            }
            let factory = Rc::clone(&entry.factory);
            factory.set_frame(entry.view.as_mut(), frame);
            entry.last_frame = Some(frame);
        }
    }
}

impl Default for BridgeSession {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
