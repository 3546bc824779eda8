//! Headless testing support: recording backend, tree snapshots.
//!
//! [`TestBackend`] stands in for a platform backend; its factories journal
//! every call and its views remember their props, listeners, and frames.
//! [`render_tree`] captures the mounted tree as plain text for assertions.

pub mod backend;
pub mod snapshot;

pub use backend::{TestBackend, TestView, TEST_TAGS};
pub use snapshot::render_tree;
