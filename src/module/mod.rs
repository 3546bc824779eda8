//! Native module RPC: named host capabilities callable from the logic side.
//!
//! A [`NativeModule`] exposes methods by name. Asynchronous calls resolve
//! through a [`Responder`], which guarantees exactly one reply per call even
//! when the module forgets to answer; synchronous calls return inline and
//! are reserved for hosts that can afford to block.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::BridgeError;

/// Outcome of a module call. Errors cross the bridge as strings.
pub type ModuleReply = Result<Value, String>;

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

/// Single-use reply carrier handed to [`NativeModule::invoke`].
///
/// `ok` and `err` consume the responder, so a call can never be answered
/// twice. Dropping an unresolved responder sends an implicit error instead,
/// so the caller never hangs on a module that lost track of the call.
pub struct Responder {
    tx: Option<oneshot::Sender<ModuleReply>>,
    module: String,
    call_id: u64,
}

impl Responder {
    fn new(tx: oneshot::Sender<ModuleReply>, module: &str, call_id: u64) -> Self {
        Self {
            tx: Some(tx),
            module: module.to_string(),
            call_id,
        }
    }

    /// Resolve the call with a value.
    pub fn ok(mut self, value: Value) {
        self.send(Ok(value));
    }

    /// Resolve the call with an error message.
    pub fn err(mut self, message: impl Into<String>) {
        self.send(Err(message.into()));
    }

    /// Which call this responder answers. Stable across the call's lifetime,
    /// so modules can use it to correlate their own logs.
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    fn send(&mut self, reply: ModuleReply) {
        if let Some(tx) = self.tx.take() {
            // The caller may have given up waiting; that is not our problem.
            let _ = tx.send(reply);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                module = %self.module,
                call_id = self.call_id,
                "module dropped the call without replying"
            );
            self.send(Err(format!("module '{}' dropped the call", self.module)));
        }
    }
}

// ---------------------------------------------------------------------------
// NativeModule
// ---------------------------------------------------------------------------

/// A named host capability, e.g. `Device`, `Storage`, `Clipboard`.
///
/// Methods receive their arguments as JSON values and reply through the
/// responder, immediately or after async work. All calls arrive on the
/// presentation thread; modules needing interior state wrap it in a
/// `RefCell`.
pub trait NativeModule {
    /// Registry key for this module.
    fn name(&self) -> &str;

    /// Handle an asynchronous call. The responder must eventually resolve;
    /// dropping it resolves the call with an implicit error.
    fn invoke(&self, method: &str, args: Vec<Value>, responder: Responder);

    /// Handle a synchronous call. Modules opt in by overriding; the default
    /// rejects every method.
    fn invoke_sync(&self, method: &str, args: Vec<Value>) -> Result<Value, String> {
        let _ = args;
        Err(BridgeError::MethodNotFound {
            module: self.name().to_string(),
            method: method.to_string(),
        }
        .to_string())
    }
}

// ---------------------------------------------------------------------------
// ModuleRegistry
// ---------------------------------------------------------------------------

/// Name-keyed table of native modules. Later registrations replace earlier
/// ones, so hosts can override built-ins.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Rc<dyn NativeModule>>,
    next_call: u64,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name, replacing any previous
    /// registration.
    pub fn register(&mut self, module: Rc<dyn NativeModule>) {
        let name = module.name().to_string();
        if self.modules.insert(name.clone(), module).is_some() {
            debug!(module = %name, "native module replaced");
        }
    }

    /// Start an asynchronous call. The returned receiver always yields
    /// exactly one [`ModuleReply`]; an unknown module resolves immediately
    /// with an error.
    pub fn invoke(
        &mut self,
        module: &str,
        method: &str,
        args: Vec<Value>,
    ) -> oneshot::Receiver<ModuleReply> {
        let (tx, rx) = oneshot::channel();
        self.invoke_with(module, method, args, tx);
        rx
    }

    /// Like [`ModuleRegistry::invoke`], resolving into a caller-supplied
    /// channel. Lets the pump hand a logic-side receiver straight to the
    /// module without a relay.
    pub fn invoke_with(
        &mut self,
        module: &str,
        method: &str,
        args: Vec<Value>,
        tx: oneshot::Sender<ModuleReply>,
    ) {
        let call_id = self.next_call;
        self.next_call += 1;

        match self.modules.get(module) {
            Some(target) => {
                debug!(call_id, module, method, "invoking native module");
                target.invoke(method, args, Responder::new(tx, module, call_id));
            }
            None => {
                warn!(call_id, module, method, "native module not found");
                let _ = tx.send(Err(BridgeError::ModuleNotFound(module.to_string()).to_string()));
            }
        }
    }

    /// Call a module synchronously. Unknown modules report the same error
    /// string the async path does.
    pub fn invoke_sync(&mut self, module: &str, method: &str, args: Vec<Value>) -> ModuleReply {
        let call_id = self.next_call;
        self.next_call += 1;

        match self.modules.get(module) {
            Some(target) => {
                debug!(call_id, module, method, "invoking native module (sync)");
                target.invoke_sync(method, args)
            }
            None => {
                warn!(call_id, module, method, "native module not found");
                Err(BridgeError::ModuleNotFound(module.to_string()).to_string())
            }
        }
    }

    /// Whether a module is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
