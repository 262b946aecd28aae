//! The structural super view.

use crate::{
    graph::{DiffGraph, EdgeId, NodeId},
    views::{SuperDiffEdge, SuperDiffNode},
    Result,
};

/// The layout-skeleton view: one node per combined position.
///
/// Exists purely to drive size and position consensus between the primary and
/// secondary views; it carries no renderable payload and no proximity state of
/// its own. Its visibility mirrors the combined view.
#[derive(Debug, Clone, Default)]
pub struct SuperGraph {
    graph: DiffGraph<SuperDiffNode, SuperDiffEdge>,
}

impl SuperGraph {
    /// Creates an empty skeleton view.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a skeleton node.
    pub(crate) fn insert_node(&mut self, node: SuperDiffNode) -> NodeId {
        self.graph.add_node(node)
    }

    /// Removes a skeleton node and its incident edges.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<SuperDiffNode> {
        self.graph.remove_node(id)
    }

    /// Inserts a skeleton edge.
    pub(crate) fn insert_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge: SuperDiffEdge,
    ) -> Result<EdgeId> {
        self.graph.add_edge(source, target, edge)
    }

    /// Removes a skeleton edge.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Option<SuperDiffEdge> {
        self.graph.remove_edge(id)
    }

    /// Returns the node with the given ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SuperDiffNode> {
        self.graph.node(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut SuperDiffNode> {
        self.graph.node_mut(id)
    }

    /// Returns the edge with the given ID.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&SuperDiffEdge> {
        self.graph.edge(id)
    }

    /// Returns an iterator over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_ids()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
