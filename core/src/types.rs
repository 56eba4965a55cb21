//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = one propagation step.
pub type Tick = u64;

/// Index of a node in the contact graph, `0..node_count`.
pub type NodeId = usize;

/// The canonical run identifier.
pub type RunId = String;
