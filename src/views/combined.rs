//! The combined overlay view.

use std::collections::HashMap;

use crate::{
    graph::{DiffGraph, EdgeId, NodeId},
    matches::AddressPair,
    views::{
        CombinedDiffEdge, CombinedDiffNode, MatchState, ProximityBrowser, SelectionHistory,
        ViewSettings,
    },
    Error::GraphError,
    Result,
};

/// The overlay view: one node per matched-or-unmatched position.
///
/// A matched position links the corresponding nodes of both single views; a
/// one-sided position links one. Positions are keyed by [`AddressPair`], so a
/// matched pair and its two one-sided forms are three distinct keys and can
/// never collide in the index.
#[derive(Debug, Clone)]
pub struct CombinedGraph {
    graph: DiffGraph<CombinedDiffNode, CombinedDiffEdge>,
    /// Map from position key to arena ID for O(1) lookup.
    by_pair: HashMap<AddressPair, NodeId>,
    proximity: ProximityBrowser,
    history: SelectionHistory,
}

impl CombinedGraph {
    /// Creates an empty overlay view.
    pub(crate) fn new(settings: &ViewSettings) -> Self {
        Self {
            graph: DiffGraph::new(),
            by_pair: HashMap::new(),
            proximity: ProximityBrowser::new(settings),
            history: SelectionHistory::new(settings.history_capacity),
        }
    }

    /// Inserts an overlay position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the pair is already present.
    pub(crate) fn insert_node(&mut self, pair: AddressPair, state: MatchState) -> Result<NodeId> {
        if self.by_pair.contains_key(&pair) {
            return Err(GraphError(format!(
                "Combined view already contains a position for {pair}"
            )));
        }
        let id = self.graph.add_node(CombinedDiffNode::new(pair, state));
        self.by_pair.insert(pair, id);
        Ok(id)
    }

    /// Removes a position and its incident edges, dropping the index entry.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<CombinedDiffNode> {
        let node = self.graph.remove_node(id)?;
        if let Some(pair) = node.pair() {
            self.by_pair.remove(&pair);
        }
        Some(node)
    }

    /// Inserts an overlay edge, temporarily unhiding hidden endpoints.
    ///
    /// Edge construction must not have the side effect of permanently unhiding
    /// nodes during proximity browsing: a hidden endpoint is made visible for
    /// the duration of the insertion and its prior visibility restored before
    /// returning.
    pub(crate) fn insert_edge_resolving_visibility(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge: CombinedDiffEdge,
    ) -> Result<EdgeId> {
        let source_was_visible = self.set_visible_returning_prior(source, true)?;
        let target_was_visible = if target == source {
            source_was_visible
        } else {
            self.set_visible_returning_prior(target, true)?
        };

        let result = self.graph.add_edge(source, target, edge);

        self.restore_visibility(source, source_was_visible);
        if target != source {
            self.restore_visibility(target, target_was_visible);
        }
        result
    }

    fn set_visible_returning_prior(&mut self, id: NodeId, visible: bool) -> Result<bool> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| GraphError(format!("Combined node {id} does not exist")))?;
        let prior = node.is_visible();
        node.set_visible(visible);
        Ok(prior)
    }

    fn restore_visibility(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.graph.node_mut(id) {
            node.set_visible(visible);
        }
    }

    /// Removes an overlay edge.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Option<CombinedDiffEdge> {
        self.graph.remove_edge(id)
    }

    /// Re-keys a position, e.g. when one side of a matched position is deleted
    /// and it degrades to one-sided.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the node does not exist, is a proxy, or the
    /// new pair is already taken.
    pub(crate) fn replace_content(
        &mut self,
        id: NodeId,
        pair: AddressPair,
        state: MatchState,
    ) -> Result<()> {
        let old_pair = self
            .graph
            .node(id)
            .and_then(CombinedDiffNode::pair)
            .ok_or_else(|| GraphError(format!("Combined node {id} is not a re-keyable position")))?;
        if pair != old_pair && self.by_pair.contains_key(&pair) {
            return Err(GraphError(format!(
                "Combined view already contains a position for {pair}"
            )));
        }

        if let Some(node) = self.graph.node_mut(id) {
            node.set_real_content(pair, state);
        }
        self.by_pair.remove(&old_pair);
        self.by_pair.insert(pair, id);
        Ok(())
    }

    /// Returns the node with the given ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CombinedDiffNode> {
        self.graph.node(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut CombinedDiffNode> {
        self.graph.node_mut(id)
    }

    /// Returns the edge with the given ID.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&CombinedDiffEdge> {
        self.graph.edge(id)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut CombinedDiffEdge> {
        self.graph.edge_mut(id)
    }

    /// Returns the `(source, target)` endpoints of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// Returns the node ID for a position key.
    #[must_use]
    pub fn node_by_pair(&self, pair: AddressPair) -> Option<NodeId> {
        self.by_pair.get(&pair).copied()
    }

    /// Returns an iterator over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_ids()
    }

    /// Returns an iterator over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edge_ids()
    }

    /// Returns the number of matched edges incident to a node.
    ///
    /// This is the local edge-delta inspection behind match add/remove: the
    /// edges that become (or stop being) matched with a node are exactly the
    /// matched edges incident to it. Self-loops are counted once.
    #[must_use]
    pub fn matched_incident_edges(&self, id: NodeId) -> u64 {
        let outgoing = self
            .graph
            .outgoing(id)
            .filter(|&e| self.graph.edge(e).is_some_and(CombinedDiffEdge::is_matched))
            .count();
        let incoming = self
            .graph
            .incoming(id)
            .filter(|&e| {
                // Skip self-loops, already counted among the outgoing edges.
                self.graph
                    .edge_endpoints(e)
                    .is_some_and(|(source, _)| source != id)
                    && self.graph.edge(e).is_some_and(CombinedDiffEdge::is_matched)
            })
            .count();
        (outgoing + incoming) as u64
    }

    /// Returns the total number of matched edges in the view.
    #[must_use]
    pub fn matched_edge_count(&self) -> u64 {
        self.graph
            .edge_ids()
            .filter(|&e| self.graph.edge(e).is_some_and(CombinedDiffEdge::is_matched))
            .count() as u64
    }

    /// Returns the IDs of all currently selected nodes, ascending.
    #[must_use]
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_ids()
            .filter(|&id| {
                self.graph
                    .node(id)
                    .is_some_and(CombinedDiffNode::is_selected)
            })
            .collect()
    }

    /// Returns the IDs of all currently visible nodes, ascending.
    ///
    /// This is the subgraph handed to the layout engine.
    #[must_use]
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_ids()
            .filter(|&id| {
                self.graph
                    .node(id)
                    .is_some_and(CombinedDiffNode::is_visible)
            })
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

    pub(crate) fn graph(&self) -> &DiffGraph<CombinedDiffNode, CombinedDiffEdge> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DiffGraph<CombinedDiffNode, CombinedDiffEdge> {
        &mut self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Address;
    use crate::views::DiffEdgeKind;

    fn one_sided(graph: &mut CombinedGraph, address: u64) -> NodeId {
        graph
            .insert_node(
                AddressPair::primary_only(Address::new(address)),
                MatchState::PrimaryOnly(NodeId::new(0)),
            )
            .unwrap()
    }

    #[test]
    fn test_edge_insertion_restores_hidden_endpoints() {
        let settings = ViewSettings::default();
        let mut graph = CombinedGraph::new(&settings);
        let a = one_sided(&mut graph, 0x1000);
        let b = one_sided(&mut graph, 0x1010);
        graph.node_mut(b).unwrap().set_visible(false);

        graph
            .insert_edge_resolving_visibility(
                a,
                b,
                CombinedDiffEdge::new(DiffEdgeKind::Call, Some(EdgeId::new(0)), None),
            )
            .unwrap();

        // The hidden endpoint is hidden again after construction.
        assert!(graph.node(a).unwrap().is_visible());
        assert!(!graph.node(b).unwrap().is_visible());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_matched_incident_edges_counts_self_loop_once() {
        let settings = ViewSettings::default();
        let mut graph = CombinedGraph::new(&settings);
        let a = one_sided(&mut graph, 0x1000);
        let b = one_sided(&mut graph, 0x1010);

        graph
            .insert_edge_resolving_visibility(
                a,
                a,
                CombinedDiffEdge::new(DiffEdgeKind::Call, Some(EdgeId::new(0)), Some(EdgeId::new(1))),
            )
            .unwrap();
        graph
            .insert_edge_resolving_visibility(
                b,
                a,
                CombinedDiffEdge::new(DiffEdgeKind::Call, Some(EdgeId::new(2)), Some(EdgeId::new(3))),
            )
            .unwrap();
        graph
            .insert_edge_resolving_visibility(
                a,
                b,
                CombinedDiffEdge::new(DiffEdgeKind::Call, Some(EdgeId::new(4)), None),
            )
            .unwrap();

        // Self-loop once, incoming matched edge once, unmatched edge not at all.
        assert_eq!(graph.matched_incident_edges(a), 2);
        assert_eq!(graph.matched_edge_count(), 2);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let settings = ViewSettings::default();
        let mut graph = CombinedGraph::new(&settings);
        one_sided(&mut graph, 0x1000);
        assert!(graph
            .insert_node(
                AddressPair::primary_only(Address::new(0x1000)),
                MatchState::PrimaryOnly(NodeId::new(0)),
            )
            .is_err());
    }
}
