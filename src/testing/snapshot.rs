//! Tree snapshot helpers.
//!
//! Renders the mounted view tree as indented plain text for snapshot-style
//! assertions: one line per view with its tag, handle, last pushed frame,
//! and (for text leaves) the current text prop.

use std::fmt::Write;

use crate::op::NodeHandle;
use crate::registry::{ViewRegistry, TEXT_PROP};

use super::backend::TestView;

/// Render the mounted tree to text, two spaces of indent per level.
///
/// Each line is `Tag #handle [x,y WxH]`; the frame part is omitted until one
/// has been pushed. Views not reachable from the root do not appear.
pub fn render_tree(views: &ViewRegistry) -> String {
    let Some(root) = views.root() else {
        return "<empty>".to_owned();
    };
    let mut out = String::new();
    render_node(views, root, 0, &mut out);
    out.trim_end().to_owned()
}

fn render_node(views: &ViewRegistry, handle: NodeHandle, depth: usize, out: &mut String) {
    let Some(entry) = views.get(handle) else { return };

    let mut line = format!("{}{} {}", "  ".repeat(depth), entry.tag, entry.handle);
    if let Some(frame) = entry.last_frame {
        let _ = write!(line, " [{},{} {}x{}]", frame.x, frame.y, frame.width, frame.height);
    }
    if let Some(view) = entry.view.as_any().downcast_ref::<TestView>() {
        if let Some(text) = view.props.get(TEXT_PROP).and_then(|value| value.as_str()) {
            let _ = write!(line, " {text:?}");
        }
    }
    let _ = writeln!(out, "{line}");

    for &child in views.children(handle) {
        render_node(views, child, depth + 1, out);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FactoryRegistry, ViewEntry};
    use crate::testing::TestBackend;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn empty_registry_renders_placeholder() {
        assert_eq!(render_tree(&ViewRegistry::new()), "<empty>");
    }

    #[test]
    fn tree_renders_with_indent_and_text() {
        let backend = TestBackend::new();
        let mut factories = FactoryRegistry::new();
        backend.install(&mut factories);

        let mut views = ViewRegistry::new();
        for (raw, tag) in [(1, "Box"), (2, "Label"), (3, "Box")] {
            let handle = NodeHandle::new(raw);
            let factory = factories.get(tag).unwrap();
            let mut view = factory.create(tag, handle);
            if tag == "Label" {
                factory.update_prop(view.as_mut(), TEXT_PROP, Some(&json!("hello")));
            }
            views.insert(ViewEntry::new(handle, tag, view, Rc::clone(&factory))).unwrap();
        }
        views.attach(NodeHandle::new(1), NodeHandle::new(2), None).unwrap();
        views.attach(NodeHandle::new(1), NodeHandle::new(3), None).unwrap();
        views.set_root(NodeHandle::new(1)).unwrap();

        let rendered = render_tree(&views);
        assert_eq!(rendered, "Box #1\n  Label #2 \"hello\"\n  Box #3");
    }
}
