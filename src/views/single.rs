//! The per-side single view.

use std::collections::HashMap;

use crate::{
    graph::{DiffGraph, EdgeId, NodeId},
    matches::Address,
    views::{
        DiffEdgeKind, ProximityBrowser, SelectionHistory, Side, SingleDiffEdge, SingleDiffNode,
        ViewSettings,
    },
    Error::GraphError,
    Result,
};

/// One side's view: the raw nodes of that side wrapped in
/// [`SingleDiffNode`]s.
///
/// Owns its node and edge arenas exclusively; correspondence with the combined
/// and super views is through the back-link indices stored in each node, never
/// through shared objects. Each view carries its own proximity state and
/// selection history.
#[derive(Debug, Clone)]
pub struct SingleGraph {
    side: Side,
    graph: DiffGraph<SingleDiffNode, SingleDiffEdge>,
    /// Map from raw node address to arena ID for O(1) lookup.
    by_address: HashMap<Address, NodeId>,
    proximity: ProximityBrowser,
    history: SelectionHistory,
}

impl SingleGraph {
    /// Creates an empty view for one side.
    pub(crate) fn new(side: Side, settings: &ViewSettings) -> Self {
        Self {
            side,
            graph: DiffGraph::new(),
            by_address: HashMap::new(),
            proximity: ProximityBrowser::new(settings),
            history: SelectionHistory::new(settings.history_capacity),
        }
    }

    /// Returns which side this view presents.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Inserts the node for a raw node address.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the address is already present.
    pub(crate) fn insert_node(&mut self, address: Address) -> Result<NodeId> {
        if self.by_address.contains_key(&address) {
            return Err(GraphError(format!(
                "{} view already contains a node for {address}",
                self.side
            )));
        }
        let id = self.graph.add_node(SingleDiffNode::new(self.side, address));
        self.by_address.insert(address, id);
        Ok(id)
    }

    /// Inserts an edge between two nodes of this view.
    pub(crate) fn insert_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: DiffEdgeKind,
    ) -> Result<EdgeId> {
        self.graph.add_edge(source, target, SingleDiffEdge::new(kind))
    }

    /// Removes a node and its incident edges, dropping the address index entry.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<SingleDiffNode> {
        let node = self.graph.remove_node(id)?;
        if let Some(address) = node.address() {
            self.by_address.remove(&address);
        }
        Some(node)
    }

    /// Returns the node with the given ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SingleDiffNode> {
        self.graph.node(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut SingleDiffNode> {
        self.graph.node_mut(id)
    }

    /// Returns the edge with the given ID.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&SingleDiffEdge> {
        self.graph.edge(id)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut SingleDiffEdge> {
        self.graph.edge_mut(id)
    }

    /// Returns the `(source, target)` endpoints of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// Returns the node ID for a raw node address.
    #[must_use]
    pub fn node_id(&self, address: Address) -> Option<NodeId> {
        self.by_address.get(&address).copied()
    }

    /// Returns an iterator over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_ids()
    }

    /// Returns the IDs of all currently selected nodes, ascending.
    #[must_use]
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_ids()
            .filter(|&id| self.graph.node(id).is_some_and(SingleDiffNode::is_selected))
            .collect()
    }

    /// Returns the IDs of all currently visible nodes, ascending.
    ///
    /// This is the subgraph handed to the layout engine.
    #[must_use]
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_ids()
            .filter(|&id| self.graph.node(id).is_some_and(SingleDiffNode::is_visible))
            .collect()
    }

    /// Returns the number of nodes, proxies included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the proximity browsing state of this view.
    #[must_use]
    pub const fn proximity(&self) -> &ProximityBrowser {
        &self.proximity
    }

    pub(crate) fn proximity_mut(&mut self) -> &mut ProximityBrowser {
        &mut self.proximity
    }

    /// Returns the selection history of this view.
    #[must_use]
    pub const fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut SelectionHistory {
        &mut self.history
    }

    pub(crate) fn graph(&self) -> &DiffGraph<SingleDiffNode, SingleDiffEdge> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DiffGraph<SingleDiffNode, SingleDiffEdge> {
        &mut self.graph
    }
}
