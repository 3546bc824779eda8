//! Hot-reload session: dev-server protocol, reconnect policy, TCP driver.

pub mod client;
pub mod protocol;
pub mod state;

pub use client::{DevClient, ReloadHandle};
pub use protocol::{ClientFrame, ServerFrame};
pub use state::{ReloadAction, ReloadEvent, ReloadMachine, ReloadState};
