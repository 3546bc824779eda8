//! TaffyTree wrapper for layout computation.
//!
//! [`LayoutEngine`] synchronizes the mounted view tree to a taffy layout
//! tree, runs the flex solver, and reports per-view frames in absolute
//! device-pixel coordinates. It never computes on its own; the session
//! decides when a batch made layout dirty and runs one pass.

use std::collections::{HashMap, HashSet};

use taffy::prelude::*;

use crate::geometry::{Point, Rect, Size};
use crate::op::NodeHandle;
use crate::registry::ViewRegistry;
use crate::style::resolve_sheet;

/// Wraps a [`TaffyTree`] and maintains a mapping from view handles to taffy
/// node ids. Provides methods to sync, compute, and query layout.
pub struct LayoutEngine {
    /// The taffy tree, parameterized with our handle as context data.
    tree: TaffyTree<NodeHandle>,
    /// Maps view handle -> taffy node id for quick lookup.
    node_map: HashMap<NodeHandle, taffy::prelude::NodeId>,
    /// The taffy root node, if a tree has been synced.
    root: Option<taffy::prelude::NodeId>,
    /// Total layout passes computed.
    passes: u64,
}

impl LayoutEngine {
    /// Create a new, empty layout engine.
    pub fn new() -> Self {
        Self { tree: TaffyTree::new(), node_map: HashMap::new(), root: None, passes: 0 }
    }

    /// Synchronize the taffy tree with the mounted view tree.
    ///
    /// Walks the registry from its root, creating or updating taffy nodes to
    /// match and re-resolving each view's style sheet. Stale taffy nodes
    /// (views destroyed or no longer reachable from the root) are removed,
    /// and parent/child relationships are rebuilt to mirror the registry.
    pub fn sync(&mut self, views: &ViewRegistry) {
        let Some(view_root) = views.root() else {
            // Nothing mounted: clear everything.
            self.clear();
            return;
        };

        let live_nodes = views.post_order(view_root);
        let live_set: HashSet<NodeHandle> = live_nodes.iter().copied().collect();

        // Remove stale taffy nodes.
        let stale_keys: Vec<NodeHandle> =
            self.node_map.keys().filter(|k| !live_set.contains(k)).copied().collect();
        for key in stale_keys {
            if let Some(taffy_id) = self.node_map.remove(&key) {
                let _ = self.tree.remove(taffy_id);
            }
        }

        // Create or update taffy nodes for all mounted views.
        for &handle in &live_nodes {
            let Some(entry) = views.get(handle) else { continue };
            let mut taffy_style = resolve_sheet(&entry.style);

            // The mount root fills the viewport unless styled otherwise.
            if handle == view_root {
                if entry.style.get("width").is_none() {
                    taffy_style.size.width = Dimension::from_percent(1.0);
                }
                if entry.style.get("height").is_none() {
                    taffy_style.size.height = Dimension::from_percent(1.0);
                }
            }

            if let Some(&taffy_id) = self.node_map.get(&handle) {
                let _ = self.tree.set_style(taffy_id, taffy_style);
            } else {
                match self.tree.new_leaf_with_context(taffy_style, handle) {
                    Ok(taffy_id) => {
                        self.node_map.insert(handle, taffy_id);
                    }
                    Err(_) => continue,
                }
            }
        }

        // Rebuild parent-child relationships in taffy to match the registry.
        for &handle in &live_nodes {
            let taffy_children: Vec<taffy::prelude::NodeId> = views
                .children(handle)
                .iter()
                .filter_map(|child| self.node_map.get(child).copied())
                .collect();
            if let Some(&taffy_id) = self.node_map.get(&handle) {
                let _ = self.tree.set_children(taffy_id, &taffy_children);
            }
        }

        self.root = self.node_map.get(&view_root).copied();
    }

    /// Run the flex solver against the viewport. No-op until a root is
    /// synced.
    pub fn compute(&mut self, viewport: Size) {
        if let Some(root) = self.root {
            let _ = self.tree.compute_layout(
                root,
                taffy::geometry::Size {
                    width: AvailableSpace::Definite(viewport.width as f32),
                    height: AvailableSpace::Definite(viewport.height as f32),
                },
            );
            self.passes += 1;
        }
    }

    /// The layout result for one view, relative to its parent's content box.
    pub fn layout_of(&self, handle: NodeHandle) -> Option<Rect> {
        let taffy_id = self.node_map.get(&handle)?;
        let layout = self.tree.layout(*taffy_id).ok()?;
        Some(Rect {
            x: layout.location.x as f64,
            y: layout.location.y as f64,
            width: layout.size.width as f64,
            height: layout.size.height as f64,
        })
    }

    /// Frames for every mounted view in absolute coordinates, parents before
    /// children. Taffy reports parent-relative locations; this walk
    /// accumulates the offsets.
    pub fn frames(&self, views: &ViewRegistry) -> Vec<(NodeHandle, Rect)> {
        let Some(root) = views.root() else { return Vec::new() };
        let mut out = Vec::new();
        let mut stack = vec![(root, Point::ZERO)];
        while let Some((handle, origin)) = stack.pop() {
            let Some(local) = self.layout_of(handle) else { continue };
            let absolute = local.translate(origin);
            out.push((handle, absolute));
            for &child in views.children(handle).iter().rev() {
                stack.push((child, absolute.origin()));
            }
        }
        out
    }

    /// Total layout passes computed since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Clear all state, removing all taffy nodes and mappings.
    fn clear(&mut self) {
        let keys: Vec<_> = self.node_map.drain().map(|(_, v)| v).collect();
        for taffy_id in keys {
            let _ = self.tree.remove(taffy_id);
        }
        self.root = None;
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
