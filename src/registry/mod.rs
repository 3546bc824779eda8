//! View registries: factory seam and the live-view table.

pub mod factory;
pub mod view;

pub use factory::{FactoryRegistry, NativeView, ViewFactory, TEXT_PROP, TEXT_TAG};
pub use view::{ViewEntry, ViewRegistry};
