//! Arena-based graph infrastructure for the diff view layer.
//!
//! Every view in this crate owns its nodes and edges in a slot arena and refers to
//! entities in other views by plain index, never by shared owning pointer. This
//! eliminates reference cycles between the single, combined and super views while
//! keeping cross-view lookups O(1).
//!
//! # Key Components
//!
//! - [`NodeId`] / [`EdgeId`] - Strongly-typed arena indices
//! - [`DiffGraph`] - Directed graph over slot arenas with node and edge removal
//! - [`BitSet`] - Compact bit vector used for visited and visibility tracking
//!
//! # Removal Semantics
//!
//! Unlike an append-only analysis graph, the diff views are mutated interactively:
//! matching two basic blocks merges two combined nodes into one, and removing a
//! match splits one node back into two. [`DiffGraph`] therefore supports removing
//! individual nodes and edges; slots are recycled through free lists and removing
//! a node cascades to its incident edges.

mod arena;
mod bitset;
mod edge;
mod node;

pub use arena::DiffGraph;
pub use bitset::BitSet;
pub use edge::EdgeId;
pub use node::NodeId;
