//! Bridge core: the presentation-side session and the channel seam.

pub mod pump;
pub mod session;

pub use pump::{bridge_channel, BridgeHandle, BridgePump};
pub use session::{BatchSummary, BridgeSession};
