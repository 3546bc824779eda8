//! # girder
//!
//! A native-UI bridge: applies declarative mutation batches from an app
//! runtime to a platform view tree.
//!
//! girder sits between a reactive UI runtime and the platform's real widgets.
//! The runtime describes what changed as a batch of small operations; girder
//! owns the shadow tree, runs flexbox layout over it, keeps native views in
//! step through a pluggable factory seam, and carries events and RPC calls
//! back and forth between the two worlds.
//!
//! ## Core Systems
//!
//! - **[`op`]** — Mutation batch protocol: typed ops, batching, JSON wire codec
//! - **[`registry`]** — Factory seam and the live shadow-tree table
//! - **[`style`]** — Style sheets, layout/paint key split, Taffy resolution
//! - **[`layout`]** — Taffy-powered flexbox engine with frame diffing
//! - **[`event`]** — Listener registry and trailing-edge gesture throttling
//! - **[`module`]** — Native module RPC with exactly-once replies
//! - **[`bridge`]** — The session core plus the async pump and channel seam
//! - **[`reload`]** — Hot-reload dev-server client over line-delimited JSON
//! - **[`testing`]** — Journaling backend and tree snapshots for tests
//! - **[`geometry`]** — Point, Size, Rect primitives
//! - **[`config`]** — Bridge and reload configuration builders
//! - **[`error`]** — The bridge error taxonomy

// Foundation
pub mod config;
pub mod error;
pub mod geometry;

// Core systems
pub mod op;
pub mod registry;
pub mod style;

// Layout and events
pub mod event;
pub mod layout;

// Host integration
pub mod bridge;
pub mod module;
pub mod reload;

// Test support
pub mod testing;
