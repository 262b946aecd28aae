//! The top-level diff session aggregate.

use std::collections::HashMap;

use crate::{
    events::{DiffEvent, EventQueue},
    matches::{
        Address, AddressPair, BasicBlockMatch, CommentStore, Correspondence, FunctionMatch,
        MatchData,
    },
    graph::NodeId,
    program::CallGraph,
    views::{GraphsContainer, Side, ViewSettings},
    Error::UnknownAddress,
    Result,
};

/// One open diff: the raw programs, the match model, the comments, and the
/// view containers built over them.
///
/// The call-graph container is built when the diff opens; flow-graph
/// containers are built lazily, one per opened function position. Runtime
/// match edits go through this type so the edit reaches both the match model
/// and every open container.
///
/// # Disposal
///
/// Closing a diff drops the containers before the match model, and inside each
/// container the combined and super views (which hold back-references into the
/// single views) before the single views. [`close`](Self::close) makes the
/// order explicit; plain `drop` follows the same field order.
#[derive(Debug)]
pub struct Diff {
    // Containers are declared (and thus dropped) before the model they index.
    call_view: Option<GraphsContainer>,
    flow_views: HashMap<AddressPair, GraphsContainer>,
    matches: MatchData,
    comments: CommentStore,
    primary: CallGraph,
    secondary: CallGraph,
    settings: ViewSettings,
    events: EventQueue,
}

impl Diff {
    /// Creates a session over two loaded programs and a match model.
    ///
    /// `matches` must publish to `events` so the session emits one ordered
    /// stream; [`MatchData::new`] with a clone of the same queue does that.
    /// No views are built yet.
    #[must_use]
    pub fn new(
        primary: CallGraph,
        secondary: CallGraph,
        matches: MatchData,
        comments: CommentStore,
        settings: ViewSettings,
        events: EventQueue,
    ) -> Self {
        Self {
            call_view: None,
            flow_views: HashMap::new(),
            matches,
            comments,
            primary,
            secondary,
            settings,
            events,
        }
    }

    /// Returns the match model.
    #[must_use]
    pub const fn matches(&self) -> &MatchData {
        &self.matches
    }

    /// Returns the comment store.
    #[must_use]
    pub const fn comments(&self) -> &CommentStore {
        &self.comments
    }

    /// Returns a mutable reference to the comment store.
    pub fn comments_mut(&mut self) -> &mut CommentStore {
        &mut self.comments
    }

    /// Returns the primary-side call graph.
    #[must_use]
    pub const fn primary(&self) -> &CallGraph {
        &self.primary
    }

    /// Returns the secondary-side call graph.
    #[must_use]
    pub const fn secondary(&self) -> &CallGraph {
        &self.secondary
    }

    /// Builds (or returns the already-built) call-graph container.
    ///
    /// Building it also replaces the matched-call total of the match model
    /// with the count derived from the combined view.
    pub fn open_call_graph_view(&mut self) -> Result<&mut GraphsContainer> {
        if self.call_view.is_none() {
            let container = GraphsContainer::build_call_graph(
                &self.primary,
                &self.secondary,
                &self.matches,
                &self.settings,
                self.events.clone(),
            )?;
            self.matches
                .set_matched_calls(container.combined().matched_edge_count());
            self.call_view = Some(container);
        }
        self.call_view
            .as_mut()
            .ok_or_else(|| inconsistent_error!("Call view missing right after build"))
    }

    /// Returns the call-graph container, if open.
    #[must_use]
    pub fn call_graph_view(&self) -> Option<&GraphsContainer> {
        self.call_view.as_ref()
    }

    /// Builds (or returns the already-built) flow-graph container for the
    /// function at the given primary-side address.
    ///
    /// An unmatched function yields a container with an empty secondary side.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAddress`] if the function is not present in the
    /// primary program.
    pub fn open_flow_view(&mut self, function_primary: Address) -> Result<&mut GraphsContainer> {
        let function = self
            .primary
            .function_at(function_primary)
            .ok_or(UnknownAddress(function_primary))?;

        let pair = match self.matches.get_counterpart(function_primary) {
            Some(secondary) => AddressPair::matched(function_primary, secondary),
            None => AddressPair::primary_only(function_primary),
        };

        if !self.flow_views.contains_key(&pair) {
            let secondary_flow = pair
                .secondary()
                .and_then(|sa| self.secondary.function_at(sa))
                .and_then(|f| f.flow_graph.as_ref());
            let container = GraphsContainer::build_flow_graph(
                pair,
                function.flow_graph.as_ref(),
                secondary_flow,
                &self.matches,
                &self.settings,
                self.events.clone(),
            )?;
            self.flow_views.insert(pair, container);
        }
        self.flow_views
            .get_mut(&pair)
            .ok_or_else(|| inconsistent_error!("Flow view for {pair} missing right after build"))
    }

    /// Returns the open flow-graph container for a function position, if any.
    #[must_use]
    pub fn flow_view(&self, function: AddressPair) -> Option<&GraphsContainer> {
        self.flow_views.get(&function)
    }

    /// Closes the flow-graph container for a function position.
    pub fn close_flow_view(&mut self, function: AddressPair) {
        self.flow_views.remove(&function);
    }

    /// Adds a function match, updating the call-graph views when they are
    /// open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if
    /// either side already participates in a match, and
    /// [`Error::UnknownAddress`](crate::Error::UnknownAddress) if a call view
    /// is open and either function is missing from its raw graph.
    pub fn add_function_match(&mut self, function: FunctionMatch) -> Result<()> {
        let primary = function.primary_address();
        match self.call_view.as_mut() {
            Some(view) => view.add_function_match(&mut self.matches, function)?,
            None => self.matches.add_function_match(function, None)?,
        }
        // A flow view opened while the function was unmatched presents stale
        // correspondence now.
        self.flow_views
            .remove(&AddressPair::primary_only(primary));
        Ok(())
    }

    /// Removes a function match, updating the call-graph views and closing the
    /// match's flow views.
    ///
    /// Returns `Ok(None)` as a no-op if no such match exists.
    pub fn remove_function_match(&mut self, primary: Address) -> Result<Option<FunctionMatch>> {
        let removed = match self.call_view.as_mut() {
            Some(view) => view.remove_function_match(&mut self.matches, primary)?,
            None => self.matches.remove_function_match(primary, None),
        };
        if let Some(function) = &removed {
            // Any open flow view of this pair presents stale correspondence.
            self.flow_views.remove(&function.address_pair());
            self.flow_views
                .remove(&AddressPair::primary_only(function.primary_address()));
        }
        Ok(removed)
    }

    /// Adds a basic-block match inside the function match containing
    /// `function_primary`, updating that function's flow views when open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAddress`](crate::Error::UnknownAddress) if no
    /// such function match exists, and
    /// [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either block
    /// already participates in a match.
    pub fn add_basic_block_match(
        &mut self,
        function_primary: Address,
        block: BasicBlockMatch,
    ) -> Result<()> {
        let pair = self.function_pair(function_primary)?;
        match self.flow_views.get_mut(&pair) {
            Some(view) => view.add_basic_block_match(&mut self.matches, block),
            None => self
                .matches
                .add_basic_block_match(function_primary, block, None),
        }
    }

    /// Removes a basic-block match, updating the function's flow views when
    /// open.
    ///
    /// Returns `Ok(None)` as a no-op if no such match exists.
    pub fn remove_basic_block_match(
        &mut self,
        function_primary: Address,
        block_primary: Address,
    ) -> Result<Option<BasicBlockMatch>> {
        let Ok(pair) = self.function_pair(function_primary) else {
            return Ok(None);
        };
        match self.flow_views.get_mut(&pair) {
            Some(view) => view.remove_basic_block_match(&mut self.matches, block_primary),
            None => Ok(self
                .matches
                .remove_basic_block_match(function_primary, block_primary, None)),
        }
    }

    /// Deletes a node from one side of the call-graph views.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`](crate::Error::GraphError) if no call view
    /// is open or the node does not exist.
    pub fn delete_call_graph_node(&mut self, side: Side, id: NodeId) -> Result<()> {
        let view = self
            .call_view
            .as_mut()
            .ok_or_else(|| crate::Error::GraphError("No call-graph view is open".to_string()))?;
        view.delete_single_node(&mut self.matches, side, id)
    }

    /// Deletes a node from one side of an open flow-graph view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`](crate::Error::GraphError) if no such view
    /// is open or the node does not exist.
    pub fn delete_flow_graph_node(
        &mut self,
        function: AddressPair,
        side: Side,
        id: NodeId,
    ) -> Result<()> {
        let view = self.flow_views.get_mut(&function).ok_or_else(|| {
            crate::Error::GraphError(format!("No flow view is open for {function}"))
        })?;
        view.delete_single_node(&mut self.matches, side, id)
    }

    /// Drains all pending change events, oldest first.
    #[must_use]
    pub fn drain_events(&self) -> Vec<DiffEvent> {
        self.events.drain()
    }

    /// Closes the session, disposing views before the match model.
    pub fn close(mut self) {
        self.flow_views.clear();
        self.call_view = None;
        // The match model and raw graphs drop with `self`.
    }

    fn function_pair(&self, function_primary: Address) -> Result<AddressPair> {
        let function = self
            .matches
            .function_by_primary(function_primary)
            .ok_or(UnknownAddress(function_primary))?;
        Ok(function.address_pair())
    }
}
