//! Style pipeline: per-view sheets, layout/paint split, taffy resolution.

pub mod resolve;
pub mod sheet;
pub mod split;

pub use resolve::resolve_sheet;
pub use sheet::{StyleDelta, StyleSheet};
pub use split::is_layout_key;
