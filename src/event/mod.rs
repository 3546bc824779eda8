//! Event system: listener registry, throttling, outbound dispatch.

pub mod dispatcher;
pub mod throttle;

pub use dispatcher::{EventDispatcher, EventRecord};
pub use throttle::ThrottleGate;
