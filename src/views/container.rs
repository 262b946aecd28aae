//! Four-view container: construction and synchronized mutation.
//!
//! [`GraphsContainer`] owns one four-view set (two single views, the combined
//! overlay, the super skeleton) over either the call graphs of both sides or
//! the flow graphs of one function pair. It is the only place that mutates
//! view structure, and every mutation is a synchronous transaction:
//!
//! - adding a match merges the two one-sided combined positions into one
//!   matched position (and mirrors the merge in the super view), then rebuilds
//!   the incident overlay edges and updates the match model with the local
//!   edge delta;
//! - removing a match is the structural inverse: the model is updated against
//!   the still-merged node, then the node splits back into two one-sided
//!   positions;
//! - deleting a node cascades to its incident edges and degrades (or removes)
//!   its overlay counterparts depending on whether the other side remains.
//!
//! All entry points validate before they mutate, so a caller error leaves
//! every view in its pre-call state.

use std::collections::HashMap;

use crate::{
    events::{DiffEvent, EventQueue},
    graph::{EdgeId, NodeId},
    matches::{Address, AddressPair, BasicBlockMatch, Correspondence, FunctionMatch, MatchData},
    program::{CallGraph, FlowGraph},
    views::{
        proximity, CombinedDiffEdge, CombinedGraph, DiffEdgeKind, MatchState, SelectionSnapshot,
        Side, SingleGraph, SuperDiffEdge, SuperDiffNode, SuperGraph, ViewRole, ViewSettings,
    },
    Error::{GraphError, UnknownAddress},
    Result,
};

/// What one container presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// The call graphs of both programs.
    CallGraph,
    /// The flow graphs of one function position (matched or one-sided).
    FlowGraph {
        /// The function position this container presents.
        function: AddressPair,
    },
}

/// One raw side flattened to the shape the builder consumes.
#[derive(Debug, Default)]
struct RawSide {
    nodes: Vec<Address>,
    edges: Vec<(Address, Address, DiffEdgeKind)>,
}

impl RawSide {
    fn from_call_graph(graph: &CallGraph) -> Self {
        Self {
            nodes: graph.functions().map(|f| f.address).collect(),
            edges: graph
                .calls()
                .map(|(from, to)| (from, to, DiffEdgeKind::Call))
                .collect(),
        }
    }

    fn from_flow_graph(graph: &FlowGraph) -> Self {
        Self {
            nodes: graph.blocks().map(|b| b.address).collect(),
            edges: graph
                .edges()
                .map(|(from, to, kind)| (from, to, DiffEdgeKind::Flow(kind)))
                .collect(),
        }
    }
}

/// One four-view set over a pair of raw graphs.
///
/// See the [module documentation](self) for the mutation contract. Views are
/// reached through [`primary`](Self::primary), [`secondary`](Self::secondary),
/// [`combined`](Self::combined) and [`super_graph`](Self::super_graph);
/// everything returned is read-only, all mutation goes through the container.
#[derive(Debug)]
pub struct GraphsContainer {
    kind: ViewKind,
    // The overlay tiers are declared (and thus dropped) before the single
    // views they index into.
    combined: CombinedGraph,
    super_graph: SuperGraph,
    primary: SingleGraph,
    secondary: SingleGraph,
    events: EventQueue,
}

impl GraphsContainer {
    /// Builds the call-graph views of a diff.
    ///
    /// One combined position is created per function match plus one per
    /// unmatched function on either side. A recorded match whose counterpart
    /// is missing from the raw graph (partially cancelled load) degrades to a
    /// one-sided position.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw graphs contain duplicate addresses.
    pub fn build_call_graph(
        primary: &CallGraph,
        secondary: &CallGraph,
        matches: &MatchData,
        settings: &ViewSettings,
        events: EventQueue,
    ) -> Result<Self> {
        let correspondence: HashMap<Address, Address> = matches
            .function_matches()
            .map(|f| (f.primary_address(), f.secondary_address()))
            .collect();
        Self::build(
            ViewKind::CallGraph,
            RawSide::from_call_graph(primary),
            RawSide::from_call_graph(secondary),
            &correspondence,
            settings,
            events,
        )
    }

    /// Builds the flow-graph views of one function position.
    ///
    /// A side with no flow graph (unmatched function, or a partially cancelled
    /// load) contributes nothing; all its positions come out one-sided on the
    /// other side.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw graphs contain duplicate addresses.
    pub fn build_flow_graph(
        function: AddressPair,
        primary: Option<&FlowGraph>,
        secondary: Option<&FlowGraph>,
        matches: &MatchData,
        settings: &ViewSettings,
        events: EventQueue,
    ) -> Result<Self> {
        let correspondence: HashMap<Address, Address> = function
            .primary()
            .and_then(|fp| matches.function_by_primary(fp))
            .map(|fm| {
                fm.basic_block_matches()
                    .map(|b| (b.primary_address(), b.secondary_address()))
                    .collect()
            })
            .unwrap_or_default();
        Self::build(
            ViewKind::FlowGraph { function },
            primary.map(RawSide::from_flow_graph).unwrap_or_default(),
            secondary.map(RawSide::from_flow_graph).unwrap_or_default(),
            &correspondence,
            settings,
            events,
        )
    }

    fn build(
        kind: ViewKind,
        raw_primary: RawSide,
        raw_secondary: RawSide,
        correspondence: &HashMap<Address, Address>,
        settings: &ViewSettings,
        events: EventQueue,
    ) -> Result<Self> {
        let mut container = Self {
            kind,
            combined: CombinedGraph::new(settings),
            super_graph: SuperGraph::new(),
            primary: SingleGraph::new(Side::Primary, settings),
            secondary: SingleGraph::new(Side::Secondary, settings),
            events,
        };

        for &address in &raw_primary.nodes {
            container.primary.insert_node(address)?;
        }
        for &address in &raw_secondary.nodes {
            container.secondary.insert_node(address)?;
        }

        // One combined position per primary node, matched where the model and
        // the secondary raw graph agree.
        for &pa in &raw_primary.nodes {
            let p_id = container
                .primary
                .node_id(pa)
                .ok_or_else(|| inconsistent_error!("Primary node {pa} vanished during build"))?;
            let counterpart = correspondence
                .get(&pa)
                .and_then(|&sa| container.secondary.node_id(sa).map(|s_id| (sa, s_id)));
            let (pair, state) = match counterpart {
                Some((sa, s_id)) => (
                    AddressPair::matched(pa, sa),
                    MatchState::Matched {
                        primary: p_id,
                        secondary: s_id,
                    },
                ),
                None => (AddressPair::primary_only(pa), MatchState::PrimaryOnly(p_id)),
            };
            container.attach_position(pair, state)?;
        }

        // One combined position per secondary node not consumed by a match.
        for &sa in &raw_secondary.nodes {
            let s_id = container
                .secondary
                .node_id(sa)
                .ok_or_else(|| inconsistent_error!("Secondary node {sa} vanished during build"))?;
            if container
                .secondary
                .node(s_id)
                .is_some_and(|n| n.combined().is_some())
            {
                continue;
            }
            container.attach_position(
                AddressPair::secondary_only(sa),
                MatchState::SecondaryOnly(s_id),
            )?;
        }

        // Single edges, then overlay edges. Secondary edges are indexed by
        // endpoint addresses so each can be consumed by at most one overlay.
        let mut primary_edges = Vec::with_capacity(raw_primary.edges.len());
        for &(from, to, edge_kind) in &raw_primary.edges {
            let f_id = container
                .primary
                .node_id(from)
                .ok_or(UnknownAddress(from))?;
            let t_id = container.primary.node_id(to).ok_or(UnknownAddress(to))?;
            let pe = container.primary.insert_edge(f_id, t_id, edge_kind)?;
            primary_edges.push((pe, from, to, edge_kind));
        }

        let mut unpaired_secondary: HashMap<(Address, Address), Vec<EdgeId>> = HashMap::new();
        let mut secondary_edges = Vec::with_capacity(raw_secondary.edges.len());
        for &(from, to, edge_kind) in &raw_secondary.edges {
            let f_id = container
                .secondary
                .node_id(from)
                .ok_or(UnknownAddress(from))?;
            let t_id = container.secondary.node_id(to).ok_or(UnknownAddress(to))?;
            let se = container.secondary.insert_edge(f_id, t_id, edge_kind)?;
            unpaired_secondary.entry((from, to)).or_default().push(se);
            secondary_edges.push(se);
        }

        for (pe, from, to, edge_kind) in primary_edges {
            let c_from = container.combined_of(Side::Primary, from)?;
            let c_to = container.combined_of(Side::Primary, to)?;
            let counterpart = correspondence.get(&from).zip(correspondence.get(&to));
            let se = counterpart.and_then(|(&sf, &st)| {
                unpaired_secondary
                    .get_mut(&(sf, st))
                    .and_then(Vec::pop)
            });
            container.attach_edge(c_from, c_to, edge_kind, Some(pe), se)?;
        }

        for se in secondary_edges {
            if container
                .secondary
                .edge(se)
                .is_some_and(|e| e.combined().is_some())
            {
                continue;
            }
            let (f_id, t_id) = container
                .secondary
                .edge_endpoints(se)
                .ok_or_else(|| inconsistent_error!("Secondary edge {se} vanished during build"))?;
            let c_from = container.combined_of_node(Side::Secondary, f_id)?;
            let c_to = container.combined_of_node(Side::Secondary, t_id)?;
            let edge_kind = container
                .secondary
                .edge(se)
                .map(|e| e.kind())
                .ok_or_else(|| inconsistent_error!("Secondary edge {se} vanished during build"))?;
            container.attach_edge(c_from, c_to, edge_kind, None, Some(se))?;
        }

        Ok(container)
    }

    /// Returns what this container presents.
    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Returns the primary single view.
    #[must_use]
    pub const fn primary(&self) -> &SingleGraph {
        &self.primary
    }

    /// Returns the secondary single view.
    #[must_use]
    pub const fn secondary(&self) -> &SingleGraph {
        &self.secondary
    }

    /// Returns the combined overlay view.
    #[must_use]
    pub const fn combined(&self) -> &CombinedGraph {
        &self.combined
    }

    /// Returns the super skeleton view.
    #[must_use]
    pub const fn super_graph(&self) -> &SuperGraph {
        &self.super_graph
    }

    /// Returns the single view of one side.
    #[must_use]
    pub const fn side(&self, side: Side) -> &SingleGraph {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    // ------------------------------------------------------------------
    // Match mutation
    // ------------------------------------------------------------------

    /// Adds a function match at runtime, merging the two one-sided call-graph
    /// positions into one matched position in all views and updating the match
    /// model with the local call-edge delta.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on a non-call-graph container,
    /// [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either side
    /// already participates in a match, and
    /// [`Error::UnknownAddress`](crate::Error::UnknownAddress) if either
    /// function is missing from its raw graph. Validation happens before any
    /// view is touched.
    pub fn add_function_match(
        &mut self,
        matches: &mut MatchData,
        function: FunctionMatch,
    ) -> Result<()> {
        if self.kind != ViewKind::CallGraph {
            return Err(GraphError(
                "Function matches can only be edited in the call-graph views".to_string(),
            ));
        }
        matches.can_add_function_match(&function)?;

        let pa = function.primary_address();
        let sa = function.secondary_address();
        let p_id = self.primary.node_id(pa).ok_or(UnknownAddress(pa))?;
        let s_id = self.secondary.node_id(sa).ok_or(UnknownAddress(sa))?;
        self.ensure_one_sided(Side::Primary, p_id)?;
        self.ensure_one_sided(Side::Secondary, s_id)?;

        let pair = function.address_pair();
        let c_id = self.merge_positions(p_id, s_id, pair)?;
        matches.add_function_match(function, Some((&self.combined, c_id)))?;
        self.refresh_after_mutation()
    }

    /// Removes a function match at runtime, splitting its call-graph position
    /// back into two one-sided positions.
    ///
    /// Returns `Ok(None)` as a no-op if no such match exists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on a non-call-graph container.
    pub fn remove_function_match(
        &mut self,
        matches: &mut MatchData,
        primary: Address,
    ) -> Result<Option<FunctionMatch>> {
        if self.kind != ViewKind::CallGraph {
            return Err(GraphError(
                "Function matches can only be edited in the call-graph views".to_string(),
            ));
        }
        let Some(function) = matches.function_by_primary(primary) else {
            return Ok(None);
        };
        let pair = function.address_pair();
        let c_id = self
            .combined
            .node_by_pair(pair)
            .ok_or_else(|| inconsistent_error!("No combined position for recorded match {pair}"))?;

        // The model sees the still-merged node so the subtracted call delta
        // equals the one added when the match was created.
        let removed = matches.remove_function_match(primary, Some((&self.combined, c_id)));
        self.split_position(c_id)?;
        self.refresh_after_mutation()?;
        Ok(removed)
    }

    /// Adds a basic-block match at runtime.
    ///
    /// In one transaction: the two one-sided flow-graph positions merge into
    /// one matched position in the combined and super views, the incident
    /// overlay edges are rebuilt (pairing edges that now exist on both sides),
    /// and the match model is updated with the local flow-edge delta taken
    /// from the freshly merged node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on a non-flow-graph container,
    /// [`Error::UnknownAddress`](crate::Error::UnknownAddress) if the
    /// function match or either block is missing, and
    /// [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either block
    /// already participates in a match. Validation happens before any view is
    /// touched.
    pub fn add_basic_block_match(
        &mut self,
        matches: &mut MatchData,
        block: BasicBlockMatch,
    ) -> Result<()> {
        let ViewKind::FlowGraph { function } = self.kind else {
            return Err(GraphError(
                "Basic-block matches can only be edited in a flow-graph view".to_string(),
            ));
        };
        let fn_primary = function.primary().ok_or_else(|| {
            GraphError("This flow view has no primary-side function".to_string())
        })?;
        matches.can_add_basic_block_match(fn_primary, &block)?;

        let pa = block.primary_address();
        let sa = block.secondary_address();
        let p_id = self.primary.node_id(pa).ok_or(UnknownAddress(pa))?;
        let s_id = self.secondary.node_id(sa).ok_or(UnknownAddress(sa))?;
        self.ensure_one_sided(Side::Primary, p_id)?;
        self.ensure_one_sided(Side::Secondary, s_id)?;

        let pair = block.address_pair();
        let c_id = self.merge_positions(p_id, s_id, pair)?;
        matches.add_basic_block_match(fn_primary, block, Some((&self.combined, c_id)))?;
        self.refresh_after_mutation()
    }

    /// Removes a basic-block match at runtime, splitting its position back
    /// into two one-sided positions.
    ///
    /// Returns `Ok(None)` as a no-op if no such match exists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on a non-flow-graph container.
    pub fn remove_basic_block_match(
        &mut self,
        matches: &mut MatchData,
        block_primary: Address,
    ) -> Result<Option<BasicBlockMatch>> {
        let ViewKind::FlowGraph { function } = self.kind else {
            return Err(GraphError(
                "Basic-block matches can only be edited in a flow-graph view".to_string(),
            ));
        };
        let fn_primary = function.primary().ok_or_else(|| {
            GraphError("This flow view has no primary-side function".to_string())
        })?;
        let Some(block) = matches.get_basic_block_match(fn_primary, block_primary) else {
            return Ok(None);
        };
        let pair = block.address_pair();
        let c_id = self
            .combined
            .node_by_pair(pair)
            .ok_or_else(|| inconsistent_error!("No combined position for recorded match {pair}"))?;

        let removed =
            matches.remove_basic_block_match(fn_primary, block_primary, Some((&self.combined, c_id)));
        self.split_position(c_id)?;
        self.refresh_after_mutation()?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Node deletion
    // ------------------------------------------------------------------

    /// Deletes a node from a single view.
    ///
    /// Incident edges are deleted first (cascade). The combined and super
    /// counterparts are deleted if and only if the other side is absent too;
    /// otherwise they degrade to one-sided positions, visible as unmatched.
    /// Deleting a proximity proxy means "expand this neighborhood", not a
    /// raw-model removal.
    ///
    /// The match records themselves are not touched; a match whose node was
    /// deleted presents as one-sided, the same way a partially cancelled load
    /// does. The derived edge totals (matched calls or this function's matched
    /// jumps) are resynchronized against the surviving overlay.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the node does not exist.
    pub fn delete_single_node(
        &mut self,
        matches: &mut MatchData,
        side: Side,
        id: NodeId,
    ) -> Result<()> {
        let view = self.side(side);
        let Some(node) = view.node(id) else {
            return Err(GraphError(format!("{side} view has no node {id}")));
        };

        if node.is_proxy() {
            return self.delete_proximity_node(ViewRole::from_side(side), id);
        }

        let combined_id = node.combined();

        // Cascade: degrade or remove the overlay of every incident edge, then
        // drop the raw node (which removes the single edges themselves).
        let incident: Vec<EdgeId> = {
            let graph = self.side(side).graph();
            let mut edges: Vec<EdgeId> = graph.incident(id).collect();
            edges.sort_unstable();
            edges.dedup();
            edges
        };
        for edge in incident {
            self.detach_single_edge_overlay(side, edge)?;
        }
        match side {
            Side::Primary => self.primary.remove_node(id),
            Side::Secondary => self.secondary.remove_node(id),
        };

        if let Some(c_id) = combined_id {
            self.degrade_or_remove_position(c_id, side, id)?;
        }

        match self.kind {
            ViewKind::CallGraph => {
                matches.set_matched_calls(self.combined.matched_edge_count());
            }
            ViewKind::FlowGraph { function } => {
                if let Some(fn_primary) = function.primary() {
                    matches
                        .sync_matched_flow_edges(fn_primary, self.combined.matched_edge_count());
                }
            }
        }
        self.refresh_after_mutation()
    }

    /// Degrades a combined edge to one-sided, or removes it if this side was
    /// its only side.
    fn detach_single_edge_overlay(&mut self, side: Side, single_edge: EdgeId) -> Result<()> {
        let Some(ce) = self
            .side(side)
            .edge(single_edge)
            .and_then(|e| e.combined())
        else {
            return Ok(());
        };
        let Some(edge) = self.combined.edge(ce) else {
            return Ok(());
        };

        let other = edge.side(side.other());
        if other.is_some() {
            // The other side survives; the overlay becomes one-sided.
            if let Some(edge) = self.combined.edge_mut(ce) {
                edge.clear_side(side);
            }
        } else {
            if let Some(super_edge) = edge.super_edge() {
                self.super_graph.remove_edge(super_edge);
            }
            self.combined.remove_edge(ce);
        }
        Ok(())
    }

    /// After one side of a position was deleted: removes the position if the
    /// other side is absent, degrades it to one-sided otherwise.
    fn degrade_or_remove_position(
        &mut self,
        c_id: NodeId,
        deleted_side: Side,
        deleted_node: NodeId,
    ) -> Result<()> {
        let Some(state) = self.combined.node(c_id).and_then(|n| n.state().copied()) else {
            return Ok(());
        };

        match (state, deleted_side) {
            (MatchState::Matched { secondary, .. }, Side::Primary) => {
                let sa = self.address_of(Side::Secondary, secondary)?;
                self.combined.replace_content(
                    c_id,
                    AddressPair::secondary_only(sa),
                    MatchState::SecondaryOnly(secondary),
                )?;
                self.update_super_state(c_id)?;
            }
            (MatchState::Matched { primary, .. }, Side::Secondary) => {
                let pa = self.address_of(Side::Primary, primary)?;
                self.combined.replace_content(
                    c_id,
                    AddressPair::primary_only(pa),
                    MatchState::PrimaryOnly(primary),
                )?;
                self.update_super_state(c_id)?;
            }
            (MatchState::PrimaryOnly(p), Side::Primary) if p == deleted_node => {
                self.detach_position(c_id)?;
            }
            (MatchState::SecondaryOnly(s), Side::Secondary) if s == deleted_node => {
                self.detach_position(c_id)?;
            }
            _ => {
                return Err(inconsistent_error!(
                    "Combined position {c_id} does not reference the deleted {deleted_side} node"
                ));
            }
        }
        Ok(())
    }

    fn update_super_state(&mut self, c_id: NodeId) -> Result<()> {
        let (state, super_id) = {
            let node = self
                .combined
                .node(c_id)
                .ok_or_else(|| inconsistent_error!("Combined position {c_id} vanished"))?;
            (
                node.state().copied().ok_or_else(|| {
                    inconsistent_error!("Combined position {c_id} lost its match state")
                })?,
                node.super_node(),
            )
        };
        if let Some(super_id) = super_id {
            if let Some(super_node) = self.super_graph.node_mut(super_id) {
                super_node.set_state(state);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Merge / split internals
    // ------------------------------------------------------------------

    fn ensure_one_sided(&self, side: Side, id: NodeId) -> Result<()> {
        let matched = self
            .side(side)
            .node(id)
            .and_then(|n| n.combined())
            .and_then(|c| self.combined.node(c))
            .is_some_and(|c| c.is_matched());
        if matched {
            return Err(inconsistent_error!(
                "{side} node {id} is already part of a matched position"
            ));
        }
        Ok(())
    }

    fn combined_of(&self, side: Side, address: Address) -> Result<NodeId> {
        let id = self
            .side(side)
            .node_id(address)
            .ok_or(UnknownAddress(address))?;
        self.combined_of_node(side, id)
    }

    fn combined_of_node(&self, side: Side, id: NodeId) -> Result<NodeId> {
        self.side(side)
            .node(id)
            .and_then(|n| n.combined())
            .ok_or_else(|| inconsistent_error!("{side} node {id} has no combined position"))
    }

    fn address_of(&self, side: Side, id: NodeId) -> Result<Address> {
        self.side(side)
            .node(id)
            .and_then(|n| n.address())
            .ok_or_else(|| inconsistent_error!("{side} node {id} has no address"))
    }

    /// Creates a combined position plus its super mirror and wires all
    /// back-links.
    fn attach_position(&mut self, pair: AddressPair, state: MatchState) -> Result<NodeId> {
        let c_id = self.combined.insert_node(pair, state)?;
        let super_id = self.super_graph.insert_node(SuperDiffNode::new(state, c_id));
        if let Some(node) = self.combined.node_mut(c_id) {
            node.set_super_node(Some(super_id));
        }
        if let Some(p) = state.primary() {
            if let Some(node) = self.primary.node_mut(p) {
                node.set_combined(Some(c_id));
                node.set_super_node(Some(super_id));
            }
        }
        if let Some(s) = state.secondary() {
            if let Some(node) = self.secondary.node_mut(s) {
                node.set_combined(Some(c_id));
                node.set_super_node(Some(super_id));
            }
        }
        Ok(c_id)
    }

    /// Removes a combined position and its super mirror, clearing every
    /// back-link into the single views first.
    fn detach_position(&mut self, c_id: NodeId) -> Result<()> {
        let incident: Vec<EdgeId> = {
            let graph = self.combined.graph();
            let mut edges: Vec<EdgeId> = graph.incident(c_id).collect();
            edges.sort_unstable();
            edges.dedup();
            edges
        };
        for ce in incident {
            if let Some(edge) = self.combined.edge(ce) {
                if let Some(pe) = edge.primary() {
                    if let Some(single) = self.primary.edge_mut(pe) {
                        single.set_combined(None);
                    }
                }
                if let Some(se) = edge.secondary() {
                    if let Some(single) = self.secondary.edge_mut(se) {
                        single.set_combined(None);
                    }
                }
            }
        }

        let (state, super_id) = {
            let node = self
                .combined
                .node(c_id)
                .ok_or_else(|| inconsistent_error!("Combined position {c_id} vanished"))?;
            (node.state().copied(), node.super_node())
        };
        if let Some(state) = state {
            if let Some(p) = state.primary() {
                if let Some(node) = self.primary.node_mut(p) {
                    node.set_combined(None);
                    node.set_super_node(None);
                }
            }
            if let Some(s) = state.secondary() {
                if let Some(node) = self.secondary.node_mut(s) {
                    node.set_combined(None);
                    node.set_super_node(None);
                }
            }
        }

        // Removing the super node cascades the mirrored super edges; removing
        // the combined node cascades the overlay edges.
        if let Some(super_id) = super_id {
            self.super_graph.remove_node(super_id);
        }
        self.combined.remove_node(c_id);
        Ok(())
    }

    /// Creates an overlay edge plus its super mirror and wires all back-links.
    fn attach_edge(
        &mut self,
        c_from: NodeId,
        c_to: NodeId,
        kind: DiffEdgeKind,
        primary_edge: Option<EdgeId>,
        secondary_edge: Option<EdgeId>,
    ) -> Result<EdgeId> {
        let ce = self.combined.insert_edge_resolving_visibility(
            c_from,
            c_to,
            CombinedDiffEdge::new(kind, primary_edge, secondary_edge),
        )?;

        let super_from = self
            .combined
            .node(c_from)
            .and_then(|n| n.super_node())
            .ok_or_else(|| inconsistent_error!("Combined position {c_from} has no super node"))?;
        let super_to = self
            .combined
            .node(c_to)
            .and_then(|n| n.super_node())
            .ok_or_else(|| inconsistent_error!("Combined position {c_to} has no super node"))?;
        let super_edge = self
            .super_graph
            .insert_edge(super_from, super_to, SuperDiffEdge::new(ce))?;
        if let Some(edge) = self.combined.edge_mut(ce) {
            edge.set_super_edge(Some(super_edge));
        }

        if let Some(pe) = primary_edge {
            if let Some(single) = self.primary.edge_mut(pe) {
                single.set_combined(Some(ce));
            }
        }
        if let Some(se) = secondary_edge {
            if let Some(single) = self.secondary.edge_mut(se) {
                single.set_combined(Some(ce));
            }
        }
        Ok(ce)
    }

    /// Merges two one-sided positions into one matched position and rebuilds
    /// the incident overlay edges.
    fn merge_positions(
        &mut self,
        p_id: NodeId,
        s_id: NodeId,
        pair: AddressPair,
    ) -> Result<NodeId> {
        let cp = self.combined_of_node(Side::Primary, p_id)?;
        let cs = self.combined_of_node(Side::Secondary, s_id)?;
        let visible = self.combined.node(cp).is_some_and(|n| n.is_visible())
            || self.combined.node(cs).is_some_and(|n| n.is_visible());

        self.detach_position(cp)?;
        self.detach_position(cs)?;

        let c_id = self.attach_position(
            pair,
            MatchState::Matched {
                primary: p_id,
                secondary: s_id,
            },
        )?;
        self.set_position_visible(c_id, visible);

        self.rebuild_detached_edges(Side::Primary, p_id)?;
        self.rebuild_detached_edges(Side::Secondary, s_id)?;
        Ok(c_id)
    }

    /// Splits one matched position back into two one-sided positions and
    /// rebuilds the incident overlay edges (now all one-sided).
    fn split_position(&mut self, c_id: NodeId) -> Result<()> {
        let (state, visible) = {
            let node = self
                .combined
                .node(c_id)
                .ok_or_else(|| inconsistent_error!("Combined position {c_id} vanished"))?;
            (
                node.state().copied().ok_or_else(|| {
                    inconsistent_error!("Cannot split proxy node {c_id}")
                })?,
                node.is_visible(),
            )
        };
        let MatchState::Matched {
            primary: p_id,
            secondary: s_id,
        } = state
        else {
            return Err(inconsistent_error!(
                "Cannot split unmatched position {c_id}"
            ));
        };

        let pa = self.address_of(Side::Primary, p_id)?;
        let sa = self.address_of(Side::Secondary, s_id)?;

        self.detach_position(c_id)?;

        let cp = self.attach_position(
            AddressPair::primary_only(pa),
            MatchState::PrimaryOnly(p_id),
        )?;
        let cs = self.attach_position(
            AddressPair::secondary_only(sa),
            MatchState::SecondaryOnly(s_id),
        )?;
        self.set_position_visible(cp, visible);
        self.set_position_visible(cs, visible);

        self.rebuild_detached_edges(Side::Primary, p_id)?;
        self.rebuild_detached_edges(Side::Secondary, s_id)?;
        Ok(())
    }

    fn set_position_visible(&mut self, c_id: NodeId, visible: bool) {
        if let Some(node) = self.combined.node_mut(c_id) {
            node.set_visible(visible);
        }
        if let Some(super_id) = self.combined.node(c_id).and_then(|n| n.super_node()) {
            if let Some(node) = self.super_graph.node_mut(super_id) {
                node.set_visible(visible);
            }
        }
    }

    /// Re-creates overlay edges for every detached single edge incident to a
    /// node, pairing each with its counterpart where both sides now exist.
    fn rebuild_detached_edges(&mut self, side: Side, id: NodeId) -> Result<()> {
        let detached: Vec<EdgeId> = {
            let graph = self.side(side).graph();
            let mut edges: Vec<EdgeId> = graph
                .incident(id)
                .filter(|&e| {
                    graph.edge(e).is_some_and(|edge| {
                        edge.combined().is_none() && edge.kind() != DiffEdgeKind::Proximity
                    })
                })
                .collect();
            edges.sort_unstable();
            edges.dedup();
            edges
        };

        for single_edge in detached {
            // A previous iteration may already have paired this edge.
            if self
                .side(side)
                .edge(single_edge)
                .is_some_and(|e| e.combined().is_some())
            {
                continue;
            }
            let (f_id, t_id) = self
                .side(side)
                .edge_endpoints(single_edge)
                .ok_or_else(|| inconsistent_error!("{side} edge {single_edge} vanished"))?;
            let kind = self
                .side(side)
                .edge(single_edge)
                .map(|e| e.kind())
                .ok_or_else(|| inconsistent_error!("{side} edge {single_edge} vanished"))?;
            let c_from = self.combined_of_node(side, f_id)?;
            let c_to = self.combined_of_node(side, t_id)?;

            let counterpart = self.find_counterpart_edge(side, c_from, c_to);
            let (primary_edge, secondary_edge) = match side {
                Side::Primary => (Some(single_edge), counterpart),
                Side::Secondary => (counterpart, Some(single_edge)),
            };
            self.attach_edge(c_from, c_to, kind, primary_edge, secondary_edge)?;
        }
        Ok(())
    }

    /// Finds an unpaired edge of the opposite side running between the same
    /// two positions, if both positions are matched.
    fn find_counterpart_edge(&self, side: Side, c_from: NodeId, c_to: NodeId) -> Option<EdgeId> {
        let other = side.other();
        let o_from = self
            .combined
            .node(c_from)
            .and_then(|n| n.state().copied())?
            .side(other)?;
        let o_to = self
            .combined
            .node(c_to)
            .and_then(|n| n.state().copied())?
            .side(other)?;

        let graph = self.side(other).graph();
        graph.outgoing(o_from).find(|&e| {
            graph
                .edge_endpoints(e)
                .is_some_and(|(_, target)| target == o_to)
                && graph.edge(e).is_some_and(|edge| {
                    edge.combined().is_none() && edge.kind() != DiffEdgeKind::Proximity
                })
        })
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Applies a selection change to one view and broadcasts it to the
    /// counterpart nodes of every other tier.
    ///
    /// The pre-mutation selection of the target view is pushed onto that
    /// view's undo history and its redo history is truncated. Publishes one
    /// [`DiffEvent::SelectionChanged`]. Unless the affected browsers are
    /// frozen, proximity re-centers on the new selection.
    pub fn select_nodes(
        &mut self,
        role: ViewRole,
        to_select: &[NodeId],
        to_deselect: &[NodeId],
    ) -> Result<()> {
        let before = SelectionSnapshot::new(self.selected_of(role));
        self.history_of_mut(role).record(before);

        for &id in to_select {
            self.set_selected(role, id, true)?;
        }
        for &id in to_deselect {
            self.set_selected(role, id, false)?;
        }
        self.events.publish(DiffEvent::SelectionChanged { view: role });
        self.after_selection_change()
    }

    /// Restores the previous selection of one view.
    ///
    /// Returns `false` if there was nothing to undo. Does not push a new undo
    /// entry; the restored selection is broadcast like any other change.
    pub fn undo_selection(&mut self, role: ViewRole) -> Result<bool> {
        let current = SelectionSnapshot::new(self.selected_of(role));
        let Some(snapshot) = self.history_of_mut(role).undo(current) else {
            return Ok(false);
        };
        self.apply_snapshot(role, &snapshot)?;
        self.events.publish(DiffEvent::SelectionChanged { view: role });
        self.after_selection_change()?;
        Ok(true)
    }

    /// Re-applies the selection undone last.
    ///
    /// Returns `false` if there was nothing to redo.
    pub fn redo_selection(&mut self, role: ViewRole) -> Result<bool> {
        let current = SelectionSnapshot::new(self.selected_of(role));
        let Some(snapshot) = self.history_of_mut(role).redo(current) else {
            return Ok(false);
        };
        self.apply_snapshot(role, &snapshot)?;
        self.events.publish(DiffEvent::SelectionChanged { view: role });
        self.after_selection_change()?;
        Ok(true)
    }

    fn apply_snapshot(&mut self, role: ViewRole, snapshot: &SelectionSnapshot) -> Result<()> {
        let ids: Vec<NodeId> = match role {
            ViewRole::Primary => self.primary.node_ids().collect(),
            ViewRole::Secondary => self.secondary.node_ids().collect(),
            ViewRole::Combined => self.combined.node_ids().collect(),
            ViewRole::Super => self.super_graph.node_ids().collect(),
        };
        for id in ids {
            let target = snapshot.contains(id);
            if self.is_selected(role, id) != Some(target) {
                self.set_selected(role, id, target)?;
            }
        }
        Ok(())
    }

    fn is_selected(&self, role: ViewRole, id: NodeId) -> Option<bool> {
        match role {
            ViewRole::Primary => self.primary.node(id).map(|n| n.is_selected()),
            ViewRole::Secondary => self.secondary.node(id).map(|n| n.is_selected()),
            ViewRole::Combined => self.combined.node(id).map(|n| n.is_selected()),
            ViewRole::Super => self.super_graph.node(id).map(|n| n.is_selected()),
        }
    }

    fn selected_of(&self, role: ViewRole) -> Vec<NodeId> {
        match role {
            ViewRole::Primary => self.primary.selected_nodes(),
            ViewRole::Secondary => self.secondary.selected_nodes(),
            ViewRole::Combined => self.combined.selected_nodes(),
            ViewRole::Super => self
                .super_graph
                .node_ids()
                .filter(|&id| self.super_graph.node(id).is_some_and(|n| n.is_selected()))
                .collect(),
        }
    }

    fn history_of_mut(&mut self, role: ViewRole) -> &mut crate::views::SelectionHistory {
        match role {
            ViewRole::Primary => self.primary.history_mut(),
            ViewRole::Secondary => self.secondary.history_mut(),
            // The super view is never interacted with directly; its history
            // slot is the combined view's.
            ViewRole::Combined | ViewRole::Super => self.combined.history_mut(),
        }
    }

    /// Sets the selected flag of one node and all of its counterparts.
    fn set_selected(&mut self, role: ViewRole, id: NodeId, selected: bool) -> Result<()> {
        let (combined_id, super_id, state) = match role {
            ViewRole::Primary | ViewRole::Secondary => {
                let side = if role == ViewRole::Primary {
                    Side::Primary
                } else {
                    Side::Secondary
                };
                let node = self
                    .side(side)
                    .node(id)
                    .ok_or_else(|| GraphError(format!("{side} view has no node {id}")))?;
                let combined_id = node.combined();
                let super_id = node.super_node();
                let state = combined_id
                    .and_then(|c| self.combined.node(c))
                    .and_then(|n| n.state().copied());
                match side {
                    Side::Primary => {
                        if let Some(n) = self.primary.node_mut(id) {
                            n.set_selected(selected);
                        }
                    }
                    Side::Secondary => {
                        if let Some(n) = self.secondary.node_mut(id) {
                            n.set_selected(selected);
                        }
                    }
                }
                (combined_id, super_id, state)
            }
            ViewRole::Combined => {
                let node = self
                    .combined
                    .node(id)
                    .ok_or_else(|| GraphError(format!("Combined view has no node {id}")))?;
                let super_id = node.super_node();
                let state = node.state().copied();
                if let Some(n) = self.combined.node_mut(id) {
                    n.set_selected(selected);
                }
                (Some(id), super_id, state)
            }
            ViewRole::Super => {
                let node = self
                    .super_graph
                    .node(id)
                    .ok_or_else(|| GraphError(format!("Super view has no node {id}")))?;
                let combined_id = node.combined();
                let state = Some(*node.state());
                if let Some(n) = self.super_graph.node_mut(id) {
                    n.set_selected(selected);
                }
                (Some(combined_id), Some(id), state)
            }
        };

        if let Some(c) = combined_id {
            if let Some(n) = self.combined.node_mut(c) {
                n.set_selected(selected);
            }
        }
        if let Some(su) = super_id {
            if let Some(n) = self.super_graph.node_mut(su) {
                n.set_selected(selected);
            }
        }
        if let Some(state) = state {
            if let Some(p) = state.primary() {
                if let Some(n) = self.primary.node_mut(p) {
                    n.set_selected(selected);
                }
            }
            if let Some(s) = state.secondary() {
                if let Some(n) = self.secondary.node_mut(s) {
                    n.set_selected(selected);
                }
            }
        }
        Ok(())
    }

    /// Re-centers every unfrozen, enabled browser on its view's selection.
    fn after_selection_change(&mut self) -> Result<()> {
        for role in [ViewRole::Primary, ViewRole::Secondary, ViewRole::Combined] {
            let (enabled, frozen) = {
                let browser = self.browser_of(role)?;
                (browser.is_enabled(), browser.is_frozen())
            };
            if !enabled || frozen {
                continue;
            }
            let anchors: Vec<NodeId> = self
                .selected_of(role)
                .into_iter()
                .filter(|&id| !self.is_proxy(role, id))
                .collect();
            if anchors.is_empty() {
                self.refold(role)?;
            } else {
                self.focus_view(role, &anchors)?;
            }
        }
        Ok(())
    }

    fn is_proxy(&self, role: ViewRole, id: NodeId) -> bool {
        match role {
            ViewRole::Primary => self.primary.node(id).is_some_and(|n| n.is_proxy()),
            ViewRole::Secondary => self.secondary.node(id).is_some_and(|n| n.is_proxy()),
            ViewRole::Combined => self.combined.node(id).is_some_and(|n| n.is_proxy()),
            ViewRole::Super => false,
        }
    }

    // ------------------------------------------------------------------
    // Proximity browsing
    // ------------------------------------------------------------------

    fn browser_of(&self, role: ViewRole) -> Result<&crate::views::ProximityBrowser> {
        match role {
            ViewRole::Primary => Ok(self.primary.proximity()),
            ViewRole::Secondary => Ok(self.secondary.proximity()),
            ViewRole::Combined => Ok(self.combined.proximity()),
            ViewRole::Super => Err(GraphError(
                "The super view has no proximity browsing".to_string(),
            )),
        }
    }

    /// Re-folds the hidden boundary of a view's current visible set.
    ///
    /// Publishes one [`DiffEvent::VisibilityChanged`].
    pub fn create_proximity_nodes(&mut self, role: ViewRole) -> Result<()> {
        self.refold(role)?;
        Ok(())
    }

    fn refold(&mut self, role: ViewRole) -> Result<()> {
        match role {
            ViewRole::Primary => {
                let browser = self.primary.proximity().clone();
                proximity::create_proximity_nodes(self.primary.graph_mut(), &browser)?;
            }
            ViewRole::Secondary => {
                let browser = self.secondary.proximity().clone();
                proximity::create_proximity_nodes(self.secondary.graph_mut(), &browser)?;
            }
            ViewRole::Combined => {
                let browser = self.combined.proximity().clone();
                proximity::create_proximity_nodes(self.combined.graph_mut(), &browser)?;
            }
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        self.events
            .publish(DiffEvent::VisibilityChanged { view: role });
        Ok(())
    }

    /// Re-centers a view's visibility on the given anchors.
    ///
    /// Publishes one [`DiffEvent::VisibilityChanged`].
    pub fn focus_view(&mut self, role: ViewRole, anchors: &[NodeId]) -> Result<()> {
        match role {
            ViewRole::Primary => {
                let browser = self.primary.proximity().clone();
                proximity::focus(self.primary.graph_mut(), &browser, anchors)?;
            }
            ViewRole::Secondary => {
                let browser = self.secondary.proximity().clone();
                proximity::focus(self.secondary.graph_mut(), &browser, anchors)?;
            }
            ViewRole::Combined => {
                let browser = self.combined.proximity().clone();
                proximity::focus(self.combined.graph_mut(), &browser, anchors)?;
            }
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        self.events
            .publish(DiffEvent::VisibilityChanged { view: role });
        Ok(())
    }

    /// Expands the neighborhood a proxy represents, then re-folds the new
    /// boundary.
    ///
    /// Publishes one [`DiffEvent::VisibilityChanged`].
    pub fn delete_proximity_node(&mut self, role: ViewRole, proxy: NodeId) -> Result<()> {
        match role {
            ViewRole::Primary => {
                proximity::delete_proximity_node(self.primary.graph_mut(), proxy)?;
            }
            ViewRole::Secondary => {
                proximity::delete_proximity_node(self.secondary.graph_mut(), proxy)?;
            }
            ViewRole::Combined => {
                proximity::delete_proximity_node(self.combined.graph_mut(), proxy)?;
            }
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        self.refold(role)
    }

    /// Full expansion: removes every proxy of a view and unhides every node.
    ///
    /// Publishes one [`DiffEvent::VisibilityChanged`].
    pub fn delete_all_proximity_nodes(&mut self, role: ViewRole) -> Result<()> {
        match role {
            ViewRole::Primary => proximity::delete_all_proximity_nodes(self.primary.graph_mut()),
            ViewRole::Secondary => {
                proximity::delete_all_proximity_nodes(self.secondary.graph_mut());
            }
            ViewRole::Combined => proximity::delete_all_proximity_nodes(self.combined.graph_mut()),
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        self.events
            .publish(DiffEvent::VisibilityChanged { view: role });
        Ok(())
    }

    /// Suspends or resumes automatic re-collapse on selection change.
    pub fn set_proximity_frozen(&mut self, role: ViewRole, frozen: bool) -> Result<()> {
        match role {
            ViewRole::Primary => self.primary.proximity_mut().set_frozen(frozen),
            ViewRole::Secondary => self.secondary.proximity_mut().set_frozen(frozen),
            ViewRole::Combined => self.combined.proximity_mut().set_frozen(frozen),
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Enables or disables proximity browsing for a view and recomputes it.
    pub fn set_proximity_enabled(&mut self, role: ViewRole, enabled: bool) -> Result<()> {
        match role {
            ViewRole::Primary => self.primary.proximity_mut().set_enabled(enabled),
            ViewRole::Secondary => self.secondary.proximity_mut().set_enabled(enabled),
            ViewRole::Combined => self.combined.proximity_mut().set_enabled(enabled),
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        self.refold(role)
    }

    /// Changes the proximity depths of a view and re-centers it on its
    /// selection (or re-folds in place when nothing is selected).
    pub fn set_proximity_depths(
        &mut self,
        role: ViewRole,
        child_depth: u32,
        parent_depth: u32,
    ) -> Result<()> {
        match role {
            ViewRole::Primary => {
                self.primary.proximity_mut().set_child_depth(child_depth);
                self.primary.proximity_mut().set_parent_depth(parent_depth);
            }
            ViewRole::Secondary => {
                self.secondary.proximity_mut().set_child_depth(child_depth);
                self.secondary.proximity_mut().set_parent_depth(parent_depth);
            }
            ViewRole::Combined => {
                self.combined.proximity_mut().set_child_depth(child_depth);
                self.combined.proximity_mut().set_parent_depth(parent_depth);
            }
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view has no proximity browsing".to_string(),
                ))
            }
        }
        let anchors: Vec<NodeId> = self
            .selected_of(role)
            .into_iter()
            .filter(|&id| !self.is_proxy(role, id))
            .collect();
        if anchors.is_empty() {
            self.refold(role)
        } else {
            self.focus_view(role, &anchors)
        }
    }

    /// Re-folds every unfrozen, enabled browser after a structural mutation.
    fn refresh_after_mutation(&mut self) -> Result<()> {
        for role in [ViewRole::Primary, ViewRole::Secondary, ViewRole::Combined] {
            let enabled = self.browser_of(role)?.is_enabled();
            if enabled {
                self.refold(role)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Consistency verification
    // ------------------------------------------------------------------

    /// Verifies the cross-view invariants against the match model.
    ///
    /// Checks, for every combined position: matched-state holds if and only if
    /// the corresponding addresses are recorded in `matches` (with a missing
    /// raw counterpart tolerated as one-sided); the back-links of the single
    /// nodes point back at the position; and the super mirror carries the same
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentState`](crate::Error::InconsistentState)
    /// describing the first violation found.
    pub fn verify_consistency(&self, matches: &MatchData) -> Result<()> {
        for c_id in self.combined.node_ids() {
            let node = self
                .combined
                .node(c_id)
                .ok_or_else(|| inconsistent_error!("Combined node {c_id} vanished"))?;
            let (Some(pair), Some(state)) = (node.pair(), node.state().copied()) else {
                continue; // proxy
            };

            let recorded = self.recorded_counterpart(matches, pair.primary());
            if state.is_matched() {
                if recorded != pair.secondary() {
                    return Err(inconsistent_error!(
                        "Position {pair} is matched in the view but records {recorded:?}"
                    ));
                }
            } else if let (Some(sa), true) = (recorded, pair.primary().is_some()) {
                // A recorded match may degrade to one-sided only when the
                // counterpart raw node is absent (partial load).
                if self.secondary.node_id(sa).is_some() {
                    return Err(inconsistent_error!(
                        "Position {pair} is unmatched in the view but {sa} is recorded and present"
                    ));
                }
            }

            if let Some(p) = state.primary() {
                if self.primary.node(p).and_then(|n| n.combined()) != Some(c_id) {
                    return Err(inconsistent_error!(
                        "Primary node of {pair} does not link back to its position"
                    ));
                }
            }
            if let Some(s) = state.secondary() {
                if self.secondary.node(s).and_then(|n| n.combined()) != Some(c_id) {
                    return Err(inconsistent_error!(
                        "Secondary node of {pair} does not link back to its position"
                    ));
                }
            }

            let super_id = node
                .super_node()
                .ok_or_else(|| inconsistent_error!("Position {pair} has no super mirror"))?;
            let super_node = self
                .super_graph
                .node(super_id)
                .ok_or_else(|| inconsistent_error!("Super mirror of {pair} vanished"))?;
            if *super_node.state() != state || super_node.combined() != c_id {
                return Err(inconsistent_error!(
                    "Super mirror of {pair} disagrees with its combined position"
                ));
            }
        }
        Ok(())
    }

    fn recorded_counterpart(
        &self,
        matches: &MatchData,
        primary: Option<Address>,
    ) -> Option<Address> {
        let primary = primary?;
        match self.kind {
            ViewKind::CallGraph => matches.get_counterpart(primary),
            ViewKind::FlowGraph { function } => function
                .primary()
                .and_then(|fp| matches.function_by_primary(fp))
                .and_then(|fm| fm.basic_block_by_primary(primary))
                .map(Correspondence::secondary_address),
        }
    }

    /// Renders the visible subgraph of one view in Graphviz DOT format for
    /// debugging.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for the super view, which is never rendered.
    pub fn to_dot(&self, role: ViewRole) -> Result<String> {
        use std::fmt::Write;

        let mut out = String::from("digraph view {\n");
        match role {
            ViewRole::Primary | ViewRole::Secondary => {
                let side = if role == ViewRole::Primary {
                    Side::Primary
                } else {
                    Side::Secondary
                };
                let view = self.side(side);
                for id in view.node_ids() {
                    let Some(node) = view.node(id) else { continue };
                    if !node.is_visible() {
                        continue;
                    }
                    let label = match node.address() {
                        Some(address) => address.to_string(),
                        None => format!("{} hidden", node.proxy().map_or(0, |p| p.hidden_count())),
                    };
                    let _ = writeln!(out, "  \"{id}\" [label=\"{label}\"];");
                }
                for edge in view.graph().edge_ids() {
                    let Some((from, to)) = view.edge_endpoints(edge) else {
                        continue;
                    };
                    let visible = view.node(from).is_some_and(|n| n.is_visible())
                        && view.node(to).is_some_and(|n| n.is_visible());
                    if visible {
                        let _ = writeln!(out, "  \"{from}\" -> \"{to}\";");
                    }
                }
            }
            ViewRole::Combined => {
                for id in self.combined.node_ids() {
                    let Some(node) = self.combined.node(id) else { continue };
                    if !node.is_visible() {
                        continue;
                    }
                    let label = match node.pair() {
                        Some(pair) => pair.to_string(),
                        None => format!("{} hidden", node.proxy().map_or(0, |p| p.hidden_count())),
                    };
                    let shape = if node.is_matched() { "box" } else { "ellipse" };
                    let _ = writeln!(out, "  \"{id}\" [label=\"{label}\", shape={shape}];");
                }
                for edge in self.combined.edge_ids() {
                    let Some((from, to)) = self.combined.edge_endpoints(edge) else {
                        continue;
                    };
                    let visible = self.combined.node(from).is_some_and(|n| n.is_visible())
                        && self.combined.node(to).is_some_and(|n| n.is_visible());
                    if !visible {
                        continue;
                    }
                    let style = if self.combined.edge(edge).is_some_and(|e| e.is_matched()) {
                        "solid"
                    } else {
                        "dashed"
                    };
                    let _ = writeln!(out, "  \"{from}\" -> \"{to}\" [style={style}];");
                }
            }
            ViewRole::Super => {
                return Err(GraphError(
                    "The super view is never rendered".to_string(),
                ))
            }
        }
        out.push_str("}\n");
        Ok(out)
    }
}
