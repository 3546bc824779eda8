//! Layout: taffy flex solving over the mounted view tree.

pub mod engine;

pub use engine::LayoutEngine;
