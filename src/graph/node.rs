//! Node identifier implementation for the arena graphs.
//!
//! This module provides the [`NodeId`] type, a strongly-typed identifier for nodes
//! within a [`DiffGraph`](crate::graph::DiffGraph). The newtype wrapper provides type
//! safety and prevents accidental confusion between node indices and other integer
//! values.

use std::fmt;

/// A strongly-typed identifier for nodes within an arena graph.
///
/// `NodeId` wraps a `usize` slot index. Node IDs are assigned when nodes are added
/// to a graph and become invalid once the node is removed; all lookups through a
/// stale ID return `None` rather than aliasing another node's data until the slot
/// is recycled.
///
/// A `NodeId` is only meaningful together with the graph that issued it. Cross-view
/// links in the diff layer store `NodeId`s of *another* view on purpose; the field
/// name records which view the index belongs to.
///
/// # Examples
///
/// ```rust,ignore
/// use diffscope::graph::{DiffGraph, NodeId};
///
/// let mut graph: DiffGraph<&str, ()> = DiffGraph::new();
/// let node_a: NodeId = graph.add_node("A");
/// let node_b: NodeId = graph.add_node("B");
/// assert_ne!(node_a, node_b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new `NodeId` from a raw slot index.
    ///
    /// This constructor is primarily intended for internal use and testing. Normal
    /// usage should obtain `NodeId` values from
    /// [`DiffGraph::add_node`](crate::graph::DiffGraph::add_node).
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw slot index of this node identifier.
    ///
    /// The index is a 0-based position that can be used to index into vectors or
    /// bit sets that store per-node data.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}
