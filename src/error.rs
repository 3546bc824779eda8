//! The bridge error taxonomy.
//!
//! Every variant here is recoverable at the point it occurs: a failing
//! operation is skipped and logged, the rest of its batch still applies, and
//! the session keeps running. Module RPC failures become error replies;
//! a lost dev-server connection triggers the reload client's retry loop.

use crate::op::NodeHandle;

/// Errors raised while applying operations or servicing calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    #[error("unknown handle: {0}")]
    UnknownHandle(NodeHandle),
    #[error("duplicate handle: {0}")]
    DuplicateHandle(NodeHandle),
    #[error("no view factory registered for tag {0:?}")]
    MissingFactory(String),
    #[error("root already set to {root}, refusing {requested}")]
    RootAlreadySet { root: NodeHandle, requested: NodeHandle },
    #[error("inserting {child} under {parent} would create a cycle")]
    CyclicInsert { parent: NodeHandle, child: NodeHandle },
    #[error("malformed op at index {index}: {reason}")]
    MalformedOp { index: usize, reason: String },
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),
    #[error("method '{method}' not found on module '{module}'")]
    MethodNotFound { module: String, method: String },
    #[error("dev server connection lost")]
    ConnectionLost,
}
