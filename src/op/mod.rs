//! Operation batch protocol: typed ops, numbered batches, JSON wire codec.

pub mod batch;
pub mod wire;

pub use batch::{NodeHandle, Op, OpBatch, OpSink};
