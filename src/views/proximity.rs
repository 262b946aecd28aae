//! Proximity browsing: depth-limited visibility with collapsible proxies.
//!
//! Large graphs stay navigable by hiding nodes beyond a configured depth from
//! the anchor set and folding each hidden boundary neighborhood behind one
//! proxy node. After every recomputation each node is in exactly one of three
//! states: visible, hidden behind exactly one proxy, or outside both depth
//! thresholds (hidden, unclaimed). A node is never both visible and behind a
//! proxy.
//!
//! Two operations divide the work:
//!
//! - [`focus`] re-centers visibility: the anchor nodes plus everything within
//!   `child_depth` below or `parent_depth` above them become visible, the rest
//!   hidden, then the boundary is folded.
//! - [`create_proximity_nodes`] re-folds the boundary of the *current* visible
//!   set without touching visibility. It is idempotent: running it twice with
//!   no intervening visibility change produces the same proxy set.
//!
//! Folding is deterministic: visible nodes are walked in ascending arena order
//! and each hidden boundary node is claimed by the first visible neighbor that
//! reaches it.

use crate::{
    graph::{BitSet, DiffGraph, NodeId},
    views::{
        node::{ProxyDirection, ProxyNode},
        CombinedDiffEdge, CombinedDiffNode, DiffEdgeKind, SingleDiffEdge, SingleDiffNode,
        ViewSettings,
    },
    Error::GraphError,
    Result,
};

/// Per-view proximity browsing state.
#[derive(Debug, Clone)]
pub struct ProximityBrowser {
    enabled: bool,
    frozen: bool,
    child_depth: u32,
    parent_depth: u32,
}

impl ProximityBrowser {
    /// Creates a browser from the container settings.
    #[must_use]
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            enabled: settings.proximity_enabled,
            frozen: false,
            child_depth: settings.child_depth,
            parent_depth: settings.parent_depth,
        }
    }

    /// Returns `true` if proximity browsing is enabled for this view.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if automatic re-collapse on selection change is
    /// suspended.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns the visible depth below the anchor set.
    #[must_use]
    pub const fn child_depth(&self) -> u32 {
        self.child_depth
    }

    /// Returns the visible depth above the anchor set.
    #[must_use]
    pub const fn parent_depth(&self) -> u32 {
        self.parent_depth
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub(crate) fn set_child_depth(&mut self, depth: u32) {
        self.child_depth = depth;
    }

    pub(crate) fn set_parent_depth(&mut self, depth: u32) {
        self.parent_depth = depth;
    }
}

/// Node access the proximity algorithms need, implemented by the single and
/// combined node types.
pub(crate) trait ProximityNodeData {
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    fn proxy(&self) -> Option<&ProxyNode>;
    /// Creates a proxy node in the same view as `self` (the anchor).
    fn make_proxy(&self, proxy: ProxyNode) -> Self;

    fn is_proxy(&self) -> bool {
        self.proxy().is_some()
    }
}

/// Edge construction the proximity algorithms need.
pub(crate) trait ProximityEdgeData {
    /// Creates the attachment edge between an anchor and its proxy.
    fn proxy_edge() -> Self;
}

impl ProximityNodeData for SingleDiffNode {
    fn is_visible(&self) -> bool {
        SingleDiffNode::is_visible(self)
    }

    fn set_visible(&mut self, visible: bool) {
        SingleDiffNode::set_visible(self, visible);
    }

    fn proxy(&self) -> Option<&ProxyNode> {
        SingleDiffNode::proxy(self)
    }

    fn make_proxy(&self, proxy: ProxyNode) -> Self {
        SingleDiffNode::new_proxy(self.side(), proxy)
    }
}

impl ProximityEdgeData for SingleDiffEdge {
    fn proxy_edge() -> Self {
        SingleDiffEdge::new(DiffEdgeKind::Proximity)
    }
}

impl ProximityNodeData for CombinedDiffNode {
    fn is_visible(&self) -> bool {
        CombinedDiffNode::is_visible(self)
    }

    fn set_visible(&mut self, visible: bool) {
        CombinedDiffNode::set_visible(self, visible);
    }

    fn proxy(&self) -> Option<&ProxyNode> {
        CombinedDiffNode::proxy(self)
    }

    fn make_proxy(&self, proxy: ProxyNode) -> Self {
        CombinedDiffNode::new_proxy(proxy)
    }
}

impl ProximityEdgeData for CombinedDiffEdge {
    fn proxy_edge() -> Self {
        CombinedDiffEdge::new(DiffEdgeKind::Proximity, None, None)
    }
}

/// Re-folds the hidden boundary of the current visible set.
///
/// Existing proxies are discarded first; visibility of real nodes is left
/// untouched. Each visible node with hidden direct neighbors gets at most one
/// proxy per direction, folding the not-yet-claimed ones.
///
/// With browsing disabled this expands everything instead.
pub(crate) fn create_proximity_nodes<N, E>(
    graph: &mut DiffGraph<N, E>,
    browser: &ProximityBrowser,
) -> Result<()>
where
    N: ProximityNodeData,
    E: ProximityEdgeData,
{
    remove_proxies(graph);

    if !browser.is_enabled() {
        set_all_visible(graph);
        return Ok(());
    }

    let capacity = graph.node_slot_count().max(1);
    let all_nodes: Vec<NodeId> = graph.node_ids().collect();

    let mut visible = BitSet::new(capacity);
    for &id in &all_nodes {
        if graph.node(id).is_some_and(ProximityNodeData::is_visible) {
            visible.insert(id.index());
        }
    }

    // Walking nodes in ascending arena order makes proxy ownership
    // deterministic: the first visible neighbor claims a hidden node.
    let mut claimed = BitSet::new(capacity);
    for &anchor in &all_nodes {
        if !visible.contains(anchor.index()) {
            continue;
        }
        for direction in [ProxyDirection::Children, ProxyDirection::Parents] {
            let neighbors: Vec<NodeId> = match direction {
                ProxyDirection::Children => graph.successors(anchor).collect(),
                ProxyDirection::Parents => graph.predecessors(anchor).collect(),
            };
            let mut hidden: Vec<NodeId> = neighbors
                .into_iter()
                .filter(|n| {
                    n.index() < capacity
                        && !visible.contains(n.index())
                        && !claimed.contains(n.index())
                })
                .collect();
            hidden.sort_unstable();
            hidden.dedup();
            if hidden.is_empty() {
                continue;
            }

            for h in &hidden {
                claimed.insert(h.index());
            }
            let data = graph
                .node(anchor)
                .ok_or_else(|| GraphError(format!("Proxy anchor {anchor} vanished")))?
                .make_proxy(ProxyNode {
                    anchor,
                    direction,
                    hidden,
                });
            let proxy_id = graph.add_node(data);
            match direction {
                ProxyDirection::Children => graph.add_edge(anchor, proxy_id, E::proxy_edge())?,
                ProxyDirection::Parents => graph.add_edge(proxy_id, anchor, E::proxy_edge())?,
            };
        }
    }
    Ok(())
}

/// Re-centers visibility on the given anchor set, then re-folds the boundary.
///
/// The anchors plus every node within `child_depth` below or `parent_depth`
/// above them become visible; all other real nodes are hidden.
pub(crate) fn focus<N, E>(
    graph: &mut DiffGraph<N, E>,
    browser: &ProximityBrowser,
    anchors: &[NodeId],
) -> Result<()>
where
    N: ProximityNodeData,
    E: ProximityEdgeData,
{
    remove_proxies(graph);

    let capacity = graph.node_slot_count().max(1);
    let anchors: Vec<NodeId> = anchors
        .iter()
        .copied()
        .filter(|&a| a.index() < capacity && graph.contains_node(a))
        .collect();

    let down = reach(graph, &anchors, browser.child_depth(), ProxyDirection::Children);
    let up = reach(graph, &anchors, browser.parent_depth(), ProxyDirection::Parents);

    let mut keep = BitSet::new(capacity);
    for &anchor in &anchors {
        keep.insert(anchor.index());
    }
    for index in down.iter() {
        keep.insert(index);
    }
    for index in up.iter() {
        keep.insert(index);
    }

    let ids: Vec<NodeId> = graph.node_ids().collect();
    for id in ids {
        if let Some(node) = graph.node_mut(id) {
            node.set_visible(keep.contains(id.index()));
        }
    }
    create_proximity_nodes(graph, browser)
}

/// Expands exactly the neighborhood the proxy represents: unhides its hidden
/// nodes and removes the proxy.
///
/// Returns the unhidden nodes. The caller is responsible for the follow-up
/// recomputation that folds the new boundary.
///
/// # Errors
///
/// Returns [`GraphError`] if the node does not exist or is not a proxy.
pub(crate) fn delete_proximity_node<N, E>(
    graph: &mut DiffGraph<N, E>,
    proxy_id: NodeId,
) -> Result<Vec<NodeId>>
where
    N: ProximityNodeData,
{
    let proxy = graph
        .node(proxy_id)
        .and_then(ProximityNodeData::proxy)
        .cloned()
        .ok_or_else(|| GraphError(format!("Node {proxy_id} is not a proximity proxy")))?;

    for &hidden in &proxy.hidden {
        if let Some(node) = graph.node_mut(hidden) {
            node.set_visible(true);
        }
    }
    graph.remove_node(proxy_id);
    Ok(proxy.hidden)
}

/// Full expansion: removes every proxy and unhides every node.
pub(crate) fn delete_all_proximity_nodes<N, E>(graph: &mut DiffGraph<N, E>)
where
    N: ProximityNodeData,
{
    remove_proxies(graph);
    set_all_visible(graph);
}

/// Returns the current proxy set as `(anchor, direction, hidden)` triples,
/// sorted, for comparisons that must ignore arena slot assignment.
pub(crate) fn proxy_summary<N, E>(
    graph: &DiffGraph<N, E>,
) -> Vec<(NodeId, ProxyDirection, Vec<NodeId>)>
where
    N: ProximityNodeData,
{
    let mut summary: Vec<(NodeId, ProxyDirection, Vec<NodeId>)> = graph
        .node_ids()
        .filter_map(|id| graph.node(id).and_then(ProximityNodeData::proxy))
        .map(|proxy| (proxy.anchor, proxy.direction, proxy.hidden.clone()))
        .collect();
    summary.sort();
    summary
}

fn remove_proxies<N, E>(graph: &mut DiffGraph<N, E>)
where
    N: ProximityNodeData,
{
    let proxies: Vec<NodeId> = graph
        .node_ids()
        .filter(|&id| graph.node(id).is_some_and(ProximityNodeData::is_proxy))
        .collect();
    for proxy in proxies {
        graph.remove_node(proxy);
    }
}

fn set_all_visible<N, E>(graph: &mut DiffGraph<N, E>)
where
    N: ProximityNodeData,
{
    let ids: Vec<NodeId> = graph.node_ids().collect();
    for id in ids {
        if let Some(node) = graph.node_mut(id) {
            node.set_visible(true);
        }
    }
}

/// Depth-limited reachability from the anchor set in one direction.
fn reach<N, E>(
    graph: &DiffGraph<N, E>,
    anchors: &[NodeId],
    depth: u32,
    direction: ProxyDirection,
) -> BitSet {
    let capacity = graph.node_slot_count().max(1);
    let mut reached = BitSet::new(capacity);
    let mut frontier: Vec<NodeId> = anchors.to_vec();

    for _ in 0..depth {
        let mut next = Vec::new();
        for &node in &frontier {
            let neighbors: Vec<NodeId> = match direction {
                ProxyDirection::Children => graph.successors(node).collect(),
                ProxyDirection::Parents => graph.predecessors(node).collect(),
            };
            for neighbor in neighbors {
                let index = neighbor.index();
                if index < capacity && !reached.contains(index) {
                    reached.insert(index);
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    reached
}
