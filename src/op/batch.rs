//! Typed view operations and the logic-side batch sink.
//!
//! The logic side describes interface changes as [`Op`] values, buffered in an
//! [`OpSink`] and flushed as one [`OpBatch`] per update cycle. Batches are
//! applied atomically and in order on the presentation side; a failing op is
//! skipped there without disturbing the rest of its batch.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// NodeHandle
// ---------------------------------------------------------------------------

/// Identity of one native view, shared by both sides of the bridge.
///
/// Handles are allocated by the logic side and opaque integers everywhere
/// else; the presentation side never derives meaning from their values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(u64);

impl NodeHandle {
    /// Wrap a raw handle value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Op
// ---------------------------------------------------------------------------

/// One imperative mutation of the native view tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Instantiate a view of `tag` and register it under `handle`.
    Create { handle: NodeHandle, tag: String },
    /// Instantiate a leaf text node with initial content.
    CreateText { handle: NodeHandle, text: String },
    /// Attach `child` under `parent`, ahead of the sibling named by
    /// `before`. `None` appends at the end.
    Insert { parent: NodeHandle, child: NodeHandle, before: Option<NodeHandle> },
    /// Detach `child` from `parent`. Subtrees still detached when the batch
    /// ends are destroyed.
    Remove { parent: NodeHandle, child: NodeHandle },
    /// Set or clear (`None`) a non-style property on a view.
    UpdateProp { handle: NodeHandle, key: String, value: Option<Value> },
    /// Merge style declarations into a view's style sheet. An explicit JSON
    /// null removes that key; omitted keys keep their current values.
    UpdateStyle { handle: NodeHandle, style: Map<String, Value> },
    /// Subscribe the logic side to `event` on a view.
    AddListener { handle: NodeHandle, event: String },
    /// Unsubscribe. Removing an absent listener is a no-op.
    RemoveListener { handle: NodeHandle, event: String },
    /// Designate the layout and mount root.
    SetRoot { handle: NodeHandle },
}

impl Op {
    /// The name this op carries on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Op::Create { .. } => "create",
            Op::CreateText { .. } => "createText",
            Op::Insert { before: Some(_), .. } => "insertChild",
            Op::Insert { before: None, .. } => "appendChild",
            Op::Remove { .. } => "removeChild",
            Op::UpdateProp { .. } => "updateProp",
            Op::UpdateStyle { .. } => "updateStyle",
            Op::AddListener { .. } => "addListener",
            Op::RemoveListener { .. } => "removeListener",
            Op::SetRoot { .. } => "setRootView",
        }
    }
}

// ---------------------------------------------------------------------------
// OpBatch
// ---------------------------------------------------------------------------

/// An ordered group of ops applied as one unit.
///
/// `seq` increases monotonically per producer; the presentation side uses it
/// for logging and to notice (but tolerate) producer restarts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpBatch {
    pub seq: u64,
    pub ops: Vec<Op>,
}

impl OpBatch {
    /// Build a batch from parts.
    pub fn new(seq: u64, ops: Vec<Op>) -> Self {
        Self { seq, ops }
    }

    /// Number of ops in the batch.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch carries no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ---------------------------------------------------------------------------
// OpSink
// ---------------------------------------------------------------------------

/// Logic-side buffer that accumulates ops and cuts numbered batches.
///
/// The renderer driving the bridge calls the emitter methods as it diffs its
/// declarative tree, then [`OpSink::take_batch`] at the end of the cycle.
#[derive(Debug, Default)]
pub struct OpSink {
    pending: Vec<Op>,
    next_seq: u64,
}

impl OpSink {
    /// Create an empty sink. The first batch is numbered 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre-built op.
    pub fn push(&mut self, op: Op) {
        self.pending.push(op);
    }

    /// Emit a create op.
    pub fn create(&mut self, handle: NodeHandle, tag: impl Into<String>) {
        self.push(Op::Create { handle, tag: tag.into() });
    }

    /// Emit a text-leaf create op.
    pub fn create_text(&mut self, handle: NodeHandle, text: impl Into<String>) {
        self.push(Op::CreateText { handle, text: text.into() });
    }

    /// Emit an insert ahead of the sibling `before`.
    pub fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, before: NodeHandle) {
        self.push(Op::Insert { parent, child, before: Some(before) });
    }

    /// Emit an append (insert at the end).
    pub fn append(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.push(Op::Insert { parent, child, before: None });
    }

    /// Emit a detach op.
    pub fn remove(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.push(Op::Remove { parent, child });
    }

    /// Emit a prop update.
    pub fn update_prop(&mut self, handle: NodeHandle, key: impl Into<String>, value: Value) {
        self.push(Op::UpdateProp { handle, key: key.into(), value: Some(value) });
    }

    /// Emit a prop clear.
    pub fn clear_prop(&mut self, handle: NodeHandle, key: impl Into<String>) {
        self.push(Op::UpdateProp { handle, key: key.into(), value: None });
    }

    /// Emit a style merge.
    pub fn update_style(&mut self, handle: NodeHandle, style: Map<String, Value>) {
        self.push(Op::UpdateStyle { handle, style });
    }

    /// Emit a listener subscription.
    pub fn add_listener(&mut self, handle: NodeHandle, event: impl Into<String>) {
        self.push(Op::AddListener { handle, event: event.into() });
    }

    /// Emit a listener removal.
    pub fn remove_listener(&mut self, handle: NodeHandle, event: impl Into<String>) {
        self.push(Op::RemoveListener { handle, event: event.into() });
    }

    /// Emit a root designation.
    pub fn set_root(&mut self, handle: NodeHandle) {
        self.push(Op::SetRoot { handle });
    }

    /// Number of ops waiting for the next batch.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the buffer into a batch stamped with the next sequence number.
    pub fn take_batch(&mut self) -> OpBatch {
        self.next_seq += 1;
        OpBatch::new(self.next_seq, std::mem::take(&mut self.pending))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
