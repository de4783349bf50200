//! Marker graph module
//!
//! Provides the read-only building graph and the breadth-first pathfinder:
//! - Graph: nodes (QR markers) and directed edges labeled with a turn
//! - Pathfinder: deterministic shortest path over unweighted edges
//! - Sample: the built-in campus floor used when no graph file is configured

mod model;
mod path;
pub mod sample;

pub use model::{Direction, EdgeSpec, Graph, GraphError, GraphSpec, NodeSpec};
pub use path::shortest_path;
