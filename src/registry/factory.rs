//! View factory seam: the traits a platform backend implements, plus the
//! tag-keyed registry the session resolves them through.
//!
//! The bridge owns native views but never understands them; every mutation
//! goes back through the factory that made the view. Factories are installed
//! at session construction (built-ins first, host extensions after) and the
//! last registration for a tag wins.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::geometry::Rect;
use crate::op::NodeHandle;

/// Reserved tag that text-leaf creation routes through.
pub const TEXT_TAG: &str = "RawText";

/// Prop key that carries a text leaf's content.
pub const TEXT_PROP: &str = "text";

// ---------------------------------------------------------------------------
// NativeView
// ---------------------------------------------------------------------------

/// A live platform view.
///
/// Opaque to the bridge; `as_any` lets the backend that created the view
/// downcast it back out (tests rely on this too). Views release their
/// platform resources on drop.
pub trait NativeView: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// ViewFactory
// ---------------------------------------------------------------------------

/// Creates and mutates native views for one or more type tags.
///
/// All calls arrive on the presentation thread. Implementations must
/// tolerate unknown prop keys and redundant listener changes; the bridge
/// forwards what the logic side sent without filtering.
pub trait ViewFactory {
    /// Instantiate a view for `tag`, registered under `handle`.
    ///
    /// The handle is the view's bridge-wide identity; backends that keep
    /// their own side tables key them by it.
    fn create(&self, tag: &str, handle: NodeHandle) -> Box<dyn NativeView>;

    /// Set a prop, or reset it to the view's default when `value` is `None`.
    fn update_prop(&self, view: &mut dyn NativeView, key: &str, value: Option<&Value>);

    /// Wire a native event source for `event` on the view.
    fn add_listener(&self, view: &mut dyn NativeView, event: &str);

    /// Unwire a native event source. Absent listeners are a no-op.
    fn remove_listener(&self, view: &mut dyn NativeView, event: &str);

    /// Attach `child` into `parent`, ahead of the sibling registered under
    /// `before` (`None` appends). The bridge has already verified the anchor
    /// is a current child of `parent`.
    fn insert_child(
        &self,
        parent: &mut dyn NativeView,
        child: &dyn NativeView,
        before: Option<NodeHandle>,
    );

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: &mut dyn NativeView, child: &dyn NativeView);

    /// Position and size the view, in device pixels absolute to the root.
    fn set_frame(&self, view: &mut dyn NativeView, frame: Rect);
}

// ---------------------------------------------------------------------------
// FactoryRegistry
// ---------------------------------------------------------------------------

/// Tag-keyed table of view factories. Later registrations replace earlier
/// ones, so hosts can override built-ins.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Rc<dyn ViewFactory>>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `tag`, replacing any previous registration.
    pub fn register(&mut self, tag: impl Into<String>, factory: Rc<dyn ViewFactory>) {
        let tag = tag.into();
        if self.factories.insert(tag.clone(), factory).is_some() {
            debug!(tag = %tag, "view factory replaced");
        }
    }

    /// Look up the factory for `tag`.
    pub fn get(&self, tag: &str) -> Option<Rc<dyn ViewFactory>> {
        self.factories.get(tag).cloned()
    }

    /// Whether any factory serves `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
