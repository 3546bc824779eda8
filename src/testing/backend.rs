//! Recording backend: view factories and view doubles for headless tests.
//!
//! [`TestBackend`] installs factories whose views record every bridge call
//! into a shared journal, in call order. Tests assert on the journal (what
//! the bridge asked the platform to do) and on the views themselves (their
//! final props, listeners, and frames).

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;

use crate::geometry::Rect;
use crate::op::NodeHandle;
use crate::registry::{FactoryRegistry, NativeView, ViewFactory, TEXT_TAG};

/// Tags the recording backend installs factories for.
pub const TEST_TAGS: [&str; 5] = ["Box", "Label", "Image", "Scroll", TEXT_TAG];

type Journal = Rc<RefCell<Vec<String>>>;

// ---------------------------------------------------------------------------
// TestBackend
// ---------------------------------------------------------------------------

/// A headless platform backend whose factories record every call.
#[derive(Clone, Default)]
pub struct TestBackend {
    journal: Journal,
}

impl TestBackend {
    /// Create a backend with an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install recording factories for all of [`TEST_TAGS`].
    pub fn install(&self, factories: &mut FactoryRegistry) {
        for tag in TEST_TAGS {
            factories.register(tag, self.factory());
        }
    }

    /// A recording factory sharing this backend's journal.
    pub fn factory(&self) -> Rc<dyn ViewFactory> {
        Rc::new(RecordingFactory { journal: Rc::clone(&self.journal) })
    }

    /// Snapshot of the journal so far.
    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// TestView
// ---------------------------------------------------------------------------

/// A native-view double that records what the bridge did to it.
pub struct TestView {
    pub handle: NodeHandle,
    pub tag: String,
    pub props: BTreeMap<String, Value>,
    pub listeners: BTreeSet<String>,
    pub frame: Option<Rect>,
    pub child_count: usize,
    journal: Journal,
}

impl NativeView for TestView {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for TestView {
    fn drop(&mut self) {
        self.journal.borrow_mut().push(format!("drop {} {}", self.tag, self.handle));
    }
}

// ---------------------------------------------------------------------------
// RecordingFactory
// ---------------------------------------------------------------------------

struct RecordingFactory {
    journal: Journal,
}

impl RecordingFactory {
    fn log(&self, line: String) {
        self.journal.borrow_mut().push(line);
    }
}

/// Downcast a bridge-owned view back to the double this backend created.
fn test_view(view: &mut dyn NativeView) -> &mut TestView {
    view.as_any_mut().downcast_mut::<TestView>().expect("view was not created by TestBackend")
}

fn peek_view(view: &dyn NativeView) -> &TestView {
    view.as_any().downcast_ref::<TestView>().expect("view was not created by TestBackend")
}

impl ViewFactory for RecordingFactory {
    fn create(&self, tag: &str, handle: NodeHandle) -> Box<dyn NativeView> {
        self.log(format!("create {tag} {handle}"));
        Box::new(TestView {
            handle,
            tag: tag.to_owned(),
            props: BTreeMap::new(),
            listeners: BTreeSet::new(),
            frame: None,
            child_count: 0,
            journal: Rc::clone(&self.journal),
        })
    }

    fn update_prop(&self, view: &mut dyn NativeView, key: &str, value: Option<&Value>) {
        let view = test_view(view);
        match value {
            Some(value) => {
                self.log(format!("prop {} {key}={value}", view.handle));
                view.props.insert(key.to_owned(), value.clone());
            }
            None => {
                self.log(format!("prop {} {key}=null", view.handle));
                view.props.remove(key);
            }
        }
    }

    fn add_listener(&self, view: &mut dyn NativeView, event: &str) {
        let view = test_view(view);
        self.log(format!("listener+ {} {event}", view.handle));
        view.listeners.insert(event.to_owned());
    }

    fn remove_listener(&self, view: &mut dyn NativeView, event: &str) {
        let view = test_view(view);
        self.log(format!("listener- {} {event}", view.handle));
        view.listeners.remove(event);
    }

    fn insert_child(
        &self,
        parent: &mut dyn NativeView,
        child: &dyn NativeView,
        before: Option<NodeHandle>,
    ) {
        let child_handle = peek_view(child).handle;
        let parent = test_view(parent);
        let at = match before {
            Some(anchor) => format!("before {anchor}"),
            None => "@end".to_owned(),
        };
        self.log(format!("insert {child_handle} into {} {at}", parent.handle));
        parent.child_count += 1;
    }

    fn remove_child(&self, parent: &mut dyn NativeView, child: &dyn NativeView) {
        let child_handle = peek_view(child).handle;
        let parent = test_view(parent);
        self.log(format!("remove {child_handle} from {}", parent.handle));
        parent.child_count = parent.child_count.saturating_sub(1);
    }

    fn set_frame(&self, view: &mut dyn NativeView, frame: Rect) {
        let view = test_view(view);
        self.log(format!(
            "frame {} {},{} {}x{}",
            view.handle, frame.x, frame.y, frame.width, frame.height
        ));
        view.frame = Some(frame);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn views_record_their_mutations() {
        let backend = TestBackend::new();
        let factory = backend.factory();

        let mut view = factory.create("Box", NodeHandle::new(1));
        factory.update_prop(view.as_mut(), "backgroundColor", Some(&json!("red")));
        factory.add_listener(view.as_mut(), "tap");
        factory.set_frame(view.as_mut(), Rect::new(0.0, 0.0, 320.0, 480.0));
        factory.update_prop(view.as_mut(), "backgroundColor", None);

        let recorded = view.as_any().downcast_ref::<TestView>().unwrap();
        assert!(recorded.props.is_empty());
        assert!(recorded.listeners.contains("tap"));
        assert_eq!(recorded.frame, Some(Rect::new(0.0, 0.0, 320.0, 480.0)));

        assert_eq!(
            backend.journal(),
            vec![
                "create Box #1",
                "prop #1 backgroundColor=\"red\"",
                "listener+ #1 tap",
                "frame #1 0,0 320x480",
                "prop #1 backgroundColor=null",
            ],
        );
    }

    #[test]
    fn drops_are_journaled() {
        let backend = TestBackend::new();
        let factory = backend.factory();
        {
            let _view = factory.create("Label", NodeHandle::new(7));
        }
        assert_eq!(backend.journal(), vec!["create Label #7", "drop Label #7"]);
    }

    #[test]
    fn child_bookkeeping() {
        let backend = TestBackend::new();
        let factory = backend.factory();
        let mut parent = factory.create("Box", NodeHandle::new(1));
        let child = factory.create("Label", NodeHandle::new(2));

        factory.insert_child(parent.as_mut(), child.as_ref(), Some(NodeHandle::new(5)));
        factory.insert_child(parent.as_mut(), child.as_ref(), None);
        factory.remove_child(parent.as_mut(), child.as_ref());

        let recorded = parent.as_any().downcast_ref::<TestView>().unwrap();
        assert_eq!(recorded.child_count, 1);
        let journal = backend.journal();
        assert_eq!(journal[2], "insert #2 into #1 before #5");
        assert_eq!(journal[3], "insert #2 into #1 @end");
        assert_eq!(journal[4], "remove #2 from #1");
    }
}
