//! Handle-keyed registry of live native views.
//!
//! One [`ViewEntry`] per mounted or pending view, holding the boxed native
//! view, the factory that made it, and the structural links (parent handle,
//! ordered child handles). The child order recorded here is authoritative
//! for layout. Structural edits keep parent and child links symmetric.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::BridgeError;
use crate::geometry::Rect;
use crate::op::NodeHandle;
use crate::style::StyleSheet;

use super::factory::{NativeView, ViewFactory};

// ---------------------------------------------------------------------------
// ViewEntry
// ---------------------------------------------------------------------------

/// Everything the bridge tracks for one live view.
pub struct ViewEntry {
    pub handle: NodeHandle,
    pub tag: String,
    pub view: Box<dyn NativeView>,
    pub factory: Rc<dyn ViewFactory>,
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
    pub style: StyleSheet,
    /// Last frame pushed to the native view; unchanged frames are skipped.
    pub last_frame: Option<Rect>,
}

impl ViewEntry {
    /// Wrap a freshly created view. Structure and style start empty.
    pub fn new(
        handle: NodeHandle,
        tag: impl Into<String>,
        view: Box<dyn NativeView>,
        factory: Rc<dyn ViewFactory>,
    ) -> Self {
        Self {
            handle,
            tag: tag.into(),
            view,
            factory,
            parent: None,
            children: Vec::new(),
            style: StyleSheet::new(),
            last_frame: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewRegistry
// ---------------------------------------------------------------------------

/// The live-view table plus the designated root.
#[derive(Default)]
pub struct ViewRegistry {
    entries: HashMap<NodeHandle, ViewEntry>,
    root: Option<NodeHandle>,
}

impl ViewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entry. The handle must not be live.
    pub fn insert(&mut self, entry: ViewEntry) -> Result<(), BridgeError> {
        if self.entries.contains_key(&entry.handle) {
            return Err(BridgeError::DuplicateHandle(entry.handle));
        }
        self.entries.insert(entry.handle, entry);
        Ok(())
    }

    /// Whether a view is live under `handle`.
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Immutable access to an entry.
    pub fn get(&self, handle: NodeHandle) -> Option<&ViewEntry> {
        self.entries.get(&handle)
    }

    /// Mutable access to an entry.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut ViewEntry> {
        self.entries.get_mut(&handle)
    }

    /// Like [`ViewRegistry::get`] but failing with `UnknownHandle`.
    pub fn entry(&self, handle: NodeHandle) -> Result<&ViewEntry, BridgeError> {
        self.entries.get(&handle).ok_or(BridgeError::UnknownHandle(handle))
    }

    /// Like [`ViewRegistry::get_mut`] but failing with `UnknownHandle`.
    pub fn entry_mut(&mut self, handle: NodeHandle) -> Result<&mut ViewEntry, BridgeError> {
        self.entries.get_mut(&handle).ok_or(BridgeError::UnknownHandle(handle))
    }

    /// The designated root, if set.
    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    /// Designate the mount root. Re-setting the same root is a no-op;
    /// a different handle while a root is live is an error.
    pub fn set_root(&mut self, handle: NodeHandle) -> Result<(), BridgeError> {
        if !self.entries.contains_key(&handle) {
            return Err(BridgeError::UnknownHandle(handle));
        }
        match self.root {
            Some(root) if root == handle => Ok(()),
            Some(root) => Err(BridgeError::RootAlreadySet { root, requested: handle }),
            None => {
                self.root = Some(handle);
                Ok(())
            }
        }
    }

    /// Attach `child` under `parent`, ahead of the sibling named by `before`
    /// (`None` appends). A child already attached elsewhere is moved. The
    /// anchor must be a current child of `parent` and not `child` itself,
    /// otherwise the attach fails with `UnknownHandle` and changes nothing.
    pub fn attach(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        before: Option<NodeHandle>,
    ) -> Result<(), BridgeError> {
        if !self.entries.contains_key(&parent) {
            return Err(BridgeError::UnknownHandle(parent));
        }
        if !self.entries.contains_key(&child) {
            return Err(BridgeError::UnknownHandle(child));
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(BridgeError::CyclicInsert { parent, child });
        }
        // Anchors are checked before the unlink so a bad one leaves the
        // child where it was. A child cannot anchor on itself; detached
        // for the move, it would no longer be a sibling.
        if let Some(anchor) = before {
            let anchored = anchor != child
                && self.entries.get(&anchor).is_some_and(|entry| entry.parent == Some(parent));
            if !anchored {
                return Err(BridgeError::UnknownHandle(anchor));
            }
        }

        self.unlink(child);
        if let Some(parent_entry) = self.entries.get_mut(&parent) {
            // Resolve the anchor's slot after the unlink; a move within the
            // same parent shifts sibling positions.
            let at = before
                .and_then(|anchor| parent_entry.children.iter().position(|&c| c == anchor))
                .unwrap_or(parent_entry.children.len());
            parent_entry.children.insert(at, child);
        }
        if let Some(child_entry) = self.entries.get_mut(&child) {
            child_entry.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `child` from `parent`. Returns `false` (doing nothing) when the
    /// child is not attached to that parent.
    pub fn detach(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<bool, BridgeError> {
        if !self.entries.contains_key(&parent) {
            return Err(BridgeError::UnknownHandle(parent));
        }
        let child_entry = self.entries.get(&child).ok_or(BridgeError::UnknownHandle(child))?;
        if child_entry.parent != Some(parent) {
            return Ok(false);
        }
        self.unlink(child);
        Ok(true)
    }

    /// The parent of `handle`, if attached.
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.entries.get(&handle).and_then(|entry| entry.parent)
    }

    /// The ordered children of `handle`. Empty for leaves and unknown handles.
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.entries
            .get(&handle)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    /// All ancestors of `handle`, nearest first.
    pub fn ancestors(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut result = Vec::new();
        let mut current = handle;
        while let Some(parent) = self.entries.get(&current).and_then(|entry| entry.parent) {
            result.push(parent);
            current = parent;
        }
        result
    }

    /// The subtree rooted at `handle`, children before parents.
    pub fn post_order(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut stack = vec![handle];
        let mut order = Vec::new();
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(entry) = self.entries.get(&current) {
                stack.extend(entry.children.iter().copied());
            }
        }
        order.reverse();
        order
    }

    /// Remove one entry, unlinking it from its parent and clearing the root
    /// if it pointed here. Children stay in the table; subtree teardown walks
    /// [`ViewRegistry::post_order`] so leaves go first.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<ViewEntry> {
        if !self.entries.contains_key(&handle) {
            return None;
        }
        self.unlink(handle);
        if self.root == Some(handle) {
            self.root = None;
        }
        self.entries.remove(&handle)
    }

    /// Tear down every entry, children before parents, returning entries in
    /// destruction order. Tops are visited in handle order so teardown is
    /// deterministic.
    pub fn drain_post_order(&mut self) -> Vec<ViewEntry> {
        let mut tops: Vec<NodeHandle> = self
            .entries
            .values()
            .filter(|entry| entry.parent.is_none())
            .map(|entry| entry.handle)
            .collect();
        tops.sort();

        let mut out = Vec::with_capacity(self.entries.len());
        for top in tops {
            for handle in self.post_order(top) {
                if let Some(entry) = self.remove(handle) {
                    out.push(entry);
                }
            }
        }
        self.root = None;
        out
    }

    /// Run `f` with mutable access to `left`'s entry and shared access to
    /// `right`'s (the right entry is lifted out of the table for the call).
    /// The handles must differ; `left == right` fails the left lookup.
    pub fn with_pair<R>(
        &mut self,
        left: NodeHandle,
        right: NodeHandle,
        f: impl FnOnce(&mut ViewEntry, &ViewEntry) -> R,
    ) -> Result<R, BridgeError> {
        let right_entry = self.entries.remove(&right).ok_or(BridgeError::UnknownHandle(right))?;
        let result = match self.entries.get_mut(&left) {
            Some(left_entry) => Ok(f(left_entry, &right_entry)),
            None => Err(BridgeError::UnknownHandle(left)),
        };
        self.entries.insert(right, right_entry);
        result
    }

    /// Number of live views.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no views are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all live entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewEntry> {
        self.entries.values()
    }

    /// Clear the child list of the old parent and the child's parent link.
    fn unlink(&mut self, child: NodeHandle) {
        let Some(old_parent) = self.entries.get(&child).and_then(|entry| entry.parent) else {
            return;
        };
        if let Some(parent_entry) = self.entries.get_mut(&old_parent) {
            parent_entry.children.retain(|&c| c != child);
        }
        if let Some(child_entry) = self.entries.get_mut(&child) {
            child_entry.parent = None;
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::factory::ViewFactory;
    use serde_json::Value;
    use std::any::Any;

    struct StubView;

    impl NativeView for StubView {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct StubFactory;

    impl ViewFactory for StubFactory {
        fn create(&self, _tag: &str, _handle: NodeHandle) -> Box<dyn NativeView> {
            Box::new(StubView)
        }
        fn update_prop(&self, _: &mut dyn NativeView, _: &str, _: Option<&Value>) {}
        fn add_listener(&self, _: &mut dyn NativeView, _: &str) {}
        fn remove_listener(&self, _: &mut dyn NativeView, _: &str) {}
        fn insert_child(&self, _: &mut dyn NativeView, _: &dyn NativeView, _: Option<NodeHandle>) {}
        fn remove_child(&self, _: &mut dyn NativeView, _: &dyn NativeView) {}
        fn set_frame(&self, _: &mut dyn NativeView, _: Rect) {}
    }

    fn h(raw: u64) -> NodeHandle {
        NodeHandle::new(raw)
    }

    fn registry_with(handles: &[u64]) -> ViewRegistry {
        let factory: Rc<dyn ViewFactory> = Rc::new(StubFactory);
        let mut registry = ViewRegistry::new();
        for &raw in handles {
            registry
                .insert(ViewEntry::new(h(raw), "Box", Box::new(StubView), Rc::clone(&factory)))
                .unwrap();
        }
        registry
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut registry = registry_with(&[1]);
        let factory: Rc<dyn ViewFactory> = Rc::new(StubFactory);
        let err = registry
            .insert(ViewEntry::new(h(1), "Box", Box::new(StubView), factory))
            .unwrap_err();
        assert_eq!(err, BridgeError::DuplicateHandle(h(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn attach_appends_and_anchors() {
        let mut registry = registry_with(&[1, 2, 3, 4]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.attach(h(1), h(3), Some(h(2))).unwrap();
        registry.attach(h(1), h(4), Some(h(2))).unwrap();
        assert_eq!(registry.children(h(1)), &[h(3), h(4), h(2)]);
        assert_eq!(registry.parent(h(4)), Some(h(1)));
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut registry = registry_with(&[1, 2, 3]);
        registry.attach(h(1), h(3), None).unwrap();
        registry.attach(h(2), h(3), None).unwrap();
        assert_eq!(registry.children(h(1)), &[] as &[NodeHandle]);
        assert_eq!(registry.children(h(2)), &[h(3)]);
        assert_eq!(registry.parent(h(3)), Some(h(2)));
    }

    #[test]
    fn attach_moves_ahead_of_a_later_sibling() {
        let mut registry = registry_with(&[1, 2, 3, 4]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.attach(h(1), h(3), None).unwrap();
        registry.attach(h(1), h(4), None).unwrap();

        // The anchor slot is where #4 sits once #2 has left the list.
        registry.attach(h(1), h(2), Some(h(4))).unwrap();
        assert_eq!(registry.children(h(1)), &[h(3), h(2), h(4)]);
    }

    #[test]
    fn attach_rejects_anchors_outside_the_parent() {
        let mut registry = registry_with(&[1, 2, 3, 4]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.attach(h(4), h(3), None).unwrap();

        // Unknown anchor.
        assert_eq!(
            registry.attach(h(1), h(3), Some(h(9))),
            Err(BridgeError::UnknownHandle(h(9))),
        );
        // Anchor attached to a different parent.
        assert_eq!(
            registry.attach(h(4), h(3), Some(h(2))),
            Err(BridgeError::UnknownHandle(h(2))),
        );
        // A child cannot anchor on itself.
        assert_eq!(
            registry.attach(h(1), h(2), Some(h(2))),
            Err(BridgeError::UnknownHandle(h(2))),
        );
        // The failed attaches left every link alone.
        assert_eq!(registry.children(h(1)), &[h(2)]);
        assert_eq!(registry.children(h(4)), &[h(3)]);
        assert_eq!(registry.parent(h(3)), Some(h(4)));
    }

    #[test]
    fn attach_rejects_unknown_and_cycles() {
        let mut registry = registry_with(&[1, 2]);
        registry.attach(h(1), h(2), None).unwrap();

        assert_eq!(
            registry.attach(h(9), h(2), None),
            Err(BridgeError::UnknownHandle(h(9))),
        );
        assert_eq!(
            registry.attach(h(1), h(9), None),
            Err(BridgeError::UnknownHandle(h(9))),
        );
        assert_eq!(
            registry.attach(h(2), h(1), None),
            Err(BridgeError::CyclicInsert { parent: h(2), child: h(1) }),
        );
        assert_eq!(
            registry.attach(h(1), h(1), None),
            Err(BridgeError::CyclicInsert { parent: h(1), child: h(1) }),
        );
        // Structure untouched by the failures.
        assert_eq!(registry.children(h(1)), &[h(2)]);
    }

    #[test]
    fn detach_is_noop_for_foreign_children() {
        let mut registry = registry_with(&[1, 2, 3]);
        registry.attach(h(1), h(3), None).unwrap();

        assert_eq!(registry.detach(h(2), h(3)), Ok(false));
        assert_eq!(registry.parent(h(3)), Some(h(1)));
        assert_eq!(registry.detach(h(1), h(3)), Ok(true));
        assert_eq!(registry.parent(h(3)), None);
        assert_eq!(registry.children(h(1)), &[] as &[NodeHandle]);
    }

    #[test]
    fn set_root_is_idempotent_but_exclusive() {
        let mut registry = registry_with(&[1, 2]);
        assert_eq!(registry.set_root(h(9)), Err(BridgeError::UnknownHandle(h(9))));
        registry.set_root(h(1)).unwrap();
        registry.set_root(h(1)).unwrap();
        assert_eq!(
            registry.set_root(h(2)),
            Err(BridgeError::RootAlreadySet { root: h(1), requested: h(2) }),
        );
        assert_eq!(registry.root(), Some(h(1)));
    }

    #[test]
    fn post_order_puts_children_first() {
        let mut registry = registry_with(&[1, 2, 3, 4]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.attach(h(1), h(3), None).unwrap();
        registry.attach(h(2), h(4), None).unwrap();

        let order = registry.post_order(h(1));
        assert_eq!(order, vec![h(4), h(2), h(3), h(1)]);
    }

    #[test]
    fn remove_unlinks_and_clears_root() {
        let mut registry = registry_with(&[1, 2]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.set_root(h(1)).unwrap();

        let removed = registry.remove(h(1)).unwrap();
        assert_eq!(removed.handle, h(1));
        assert_eq!(registry.root(), None);
        // Child 2 is still in the table; subtree teardown removes leaves
        // before their parents.
        assert!(registry.contains(h(2)));
    }

    #[test]
    fn drain_post_order_empties_everything() {
        let mut registry = registry_with(&[1, 2, 3, 10]);
        registry.attach(h(1), h(2), None).unwrap();
        registry.attach(h(2), h(3), None).unwrap();
        registry.set_root(h(1)).unwrap();

        let drained = registry.drain_post_order();
        let order: Vec<NodeHandle> = drained.iter().map(|entry| entry.handle).collect();
        assert_eq!(order, vec![h(3), h(2), h(1), h(10)]);
        assert!(registry.is_empty());
        assert_eq!(registry.root(), None);
    }

    #[test]
    fn with_pair_restores_the_lifted_entry() {
        let mut registry = registry_with(&[1, 2]);
        let tag = registry
            .with_pair(h(1), h(2), |parent, child| {
                (parent.tag.clone(), child.tag.clone())
            })
            .unwrap();
        assert_eq!(tag, ("Box".to_string(), "Box".to_string()));
        assert!(registry.contains(h(1)));
        assert!(registry.contains(h(2)));
        assert_eq!(
            registry.with_pair(h(1), h(9), |_, _| ()),
            Err(BridgeError::UnknownHandle(h(9))),
        );
    }
}
