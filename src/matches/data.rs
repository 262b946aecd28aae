//! The match aggregate of one diff session.
//!
//! [`MatchData`] owns every [`FunctionMatch`] of a diff and is the single source
//! of truth for what is matched. The view layer derives its matched-state from
//! it and hands back local edge-delta context when matches change at runtime, so
//! the running totals stay exact without any global recomputation.

use crate::{
    events::{DiffEvent, EventQueue},
    matches::{
        bipartite::{BipartiteMatchMap, Correspondence},
        Address, BasicBlockMatch, FunctionMatch,
    },
    views::CombinedGraph,
    graph::NodeId,
    Result,
};

/// Running totals of one diff session.
///
/// Maintained incrementally on every mutation and delivered to observers
/// through [`DiffEvent::CountsChanged`]; observers never recount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffCounts {
    /// Number of function matches.
    pub matched_functions: u64,
    /// Number of function matches with similarity below 1.
    pub changed_functions: u64,
    /// Number of call-graph edges present on both sides between matched
    /// functions.
    pub matched_calls: u64,
    /// Number of basic-block matches across all function matches.
    pub matched_basic_blocks: u64,
    /// Number of flow-graph edges present on both sides between matched basic
    /// blocks.
    pub matched_jumps: u64,
    /// Number of instruction matches across all basic-block matches.
    pub matched_instructions: u64,
}

/// Local view context for edge-delta computation during a match mutation.
///
/// When a basic-block or function match is added, the edges that become matched
/// are exactly the matched edges incident to the freshly merged combined node;
/// when a match is removed, the edges that stop being matched are those incident
/// to the combined node about to be split. Callers that mutate the bare model
/// (the loader, tests) pass no context and the edge counters stay untouched.
pub type CombinedNodeContext<'a> = Option<(&'a CombinedGraph, NodeId)>;

/// All function matches of one diff, with bidirectional lookup and running
/// totals.
///
/// # Invariants
///
/// - Every primary address and every secondary address participates in at most
///   one function match (bipartite uniqueness, enforced on insert).
/// - Every basic-block match lives inside a function match owned by this
///   aggregate; removing a function match cascades to its basic-block and
///   instruction matches.
/// - The running totals equal the true cardinalities after every mutation.
///   This is verified defensively: drift is fatal in debug builds and repaired
///   with an error log in release builds.
///
/// # Notification
///
/// Every mutation publishes its structural event plus one
/// [`DiffEvent::CountsChanged`] to the session's [`EventQueue`]. Removal of a
/// non-existent match is a no-op and publishes nothing.
#[derive(Debug, Clone)]
pub struct MatchData {
    functions: BipartiteMatchMap<FunctionMatch>,
    counts: DiffCounts,
    events: EventQueue,
}

impl MatchData {
    /// Creates an empty match aggregate publishing to the given queue.
    #[must_use]
    pub fn new(events: EventQueue) -> Self {
        Self {
            functions: BipartiteMatchMap::new(),
            counts: DiffCounts::default(),
            events,
        }
    }

    /// Returns the current running totals.
    #[must_use]
    pub const fn counts(&self) -> DiffCounts {
        self.counts
    }

    /// Returns the function match containing the given primary-side address.
    #[must_use]
    pub fn function_by_primary(&self, primary: Address) -> Option<&FunctionMatch> {
        self.functions.get_by_primary(primary)
    }

    /// Returns the function match containing the given secondary-side address.
    #[must_use]
    pub fn function_by_secondary(&self, secondary: Address) -> Option<&FunctionMatch> {
        self.functions.get_by_secondary(secondary)
    }

    /// Returns an iterator over all function matches, in unspecified order.
    pub fn function_matches(&self) -> impl Iterator<Item = &FunctionMatch> {
        self.functions.iter()
    }

    /// Returns the number of function matches.
    #[must_use]
    pub fn function_match_count(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if the given function address is matched, looked up on
    /// the primary side.
    #[must_use]
    pub fn is_matched(&self, primary: Address) -> bool {
        self.functions.get_by_primary(primary).is_some()
    }

    /// Returns the counterpart address of a matched function, looked up from
    /// the primary side.
    #[must_use]
    pub fn get_counterpart(&self, primary: Address) -> Option<Address> {
        self.functions
            .get_by_primary(primary)
            .map(Correspondence::secondary_address)
    }

    /// Returns the basic-block match for a primary-side block address within
    /// the function match containing `function_primary`.
    #[must_use]
    pub fn get_basic_block_match(
        &self,
        function_primary: Address,
        block_primary: Address,
    ) -> Option<&BasicBlockMatch> {
        self.functions
            .get_by_primary(function_primary)?
            .basic_block_by_primary(block_primary)
    }

    /// Returns `Ok` if `function` could be added without violating bipartite
    /// uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either
    /// side's address already participates in a function match.
    pub fn can_add_function_match(&self, function: &FunctionMatch) -> Result<()> {
        if self.functions.conflicts(function) {
            return Err(crate::Error::DuplicateMatch(function.address_pair()));
        }
        Ok(())
    }

    /// Adds a function match.
    ///
    /// `call_context`, when present, is the freshly merged combined call-graph
    /// node of the new match; its matched incident edges are the calls that
    /// became matched and are added to the totals.
    ///
    /// Publishes [`DiffEvent::FunctionMatchAdded`] and one
    /// [`DiffEvent::CountsChanged`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either
    /// side's address already participates in a function match; the aggregate is
    /// left unchanged.
    pub fn add_function_match(
        &mut self,
        function: FunctionMatch,
        call_context: CombinedNodeContext<'_>,
    ) -> Result<()> {
        let pair = function.address_pair();
        let changed = u64::from(function.is_changed());
        let blocks = function.matched_basic_blocks();
        let jumps = function.matched_flow_edges();
        let instructions = function.matched_instructions();
        let calls = matched_incident_edges(call_context);

        self.functions.insert(function)?;

        self.counts.matched_functions += 1;
        self.counts.changed_functions += changed;
        self.counts.matched_basic_blocks += blocks;
        self.counts.matched_jumps += jumps;
        self.counts.matched_instructions += instructions;
        self.counts.matched_calls += calls;

        self.events.publish(DiffEvent::FunctionMatchAdded { pair });
        self.events.publish(DiffEvent::CountsChanged(self.counts));
        self.check_counters();
        Ok(())
    }

    /// Removes the function match containing the given primary-side address,
    /// cascading to its basic-block and instruction matches.
    ///
    /// `call_context`, when present, is the still-merged combined call-graph
    /// node of the match; its matched incident edges are the calls that stop
    /// being matched and are subtracted from the totals.
    ///
    /// Returns `None` without touching any state or publishing anything if no
    /// such match exists.
    pub fn remove_function_match(
        &mut self,
        primary: Address,
        call_context: CombinedNodeContext<'_>,
    ) -> Option<FunctionMatch> {
        let calls = matched_incident_edges(call_context);
        let function = self.functions.remove_by_primary(primary)?;
        let pair = function.address_pair();

        self.counts.matched_functions -= 1;
        self.counts.changed_functions -= u64::from(function.is_changed());
        self.counts.matched_basic_blocks -= function.matched_basic_blocks();
        self.counts.matched_jumps -= function.matched_flow_edges();
        self.counts.matched_instructions -= function.matched_instructions();
        self.counts.matched_calls = self.counts.matched_calls.saturating_sub(calls);

        self.events.publish(DiffEvent::FunctionMatchRemoved { pair });
        self.events.publish(DiffEvent::CountsChanged(self.counts));
        self.check_counters();
        Some(function)
    }

    /// Returns `Ok` if `block` could be added to the function match containing
    /// `function_primary`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAddress`](crate::Error::UnknownAddress) if no
    /// such function match exists, or
    /// [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either block
    /// address already participates in a match within it.
    pub fn can_add_basic_block_match(
        &self,
        function_primary: Address,
        block: &BasicBlockMatch,
    ) -> Result<()> {
        let function = self
            .functions
            .get_by_primary(function_primary)
            .ok_or(crate::Error::UnknownAddress(function_primary))?;
        function.can_add_basic_block_match(block)
    }

    /// Adds a basic-block match to the function match containing
    /// `function_primary`.
    ///
    /// `flow_context`, when present, is the freshly merged combined flow-graph
    /// node of the new match. The flow edges that became matched are exactly
    /// the matched edges now incident to that node; this local inspection is
    /// what keeps the edge totals exact without a global recount.
    ///
    /// Publishes [`DiffEvent::BasicBlockMatchAdded`] and one
    /// [`DiffEvent::CountsChanged`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAddress`](crate::Error::UnknownAddress) if no
    /// such function match exists, or
    /// [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either block
    /// address already participates in a match; the aggregate is left unchanged
    /// in both cases.
    pub fn add_basic_block_match(
        &mut self,
        function_primary: Address,
        block: BasicBlockMatch,
        flow_context: CombinedNodeContext<'_>,
    ) -> Result<()> {
        let pair = block.address_pair();
        let instructions = block.matched_instructions();
        let jumps = matched_incident_edges(flow_context);

        let function = self
            .functions
            .get_by_primary_mut(function_primary)
            .ok_or(crate::Error::UnknownAddress(function_primary))?;
        let function_pair = function.address_pair();

        function.add_basic_block_match(block)?;
        function.add_flow_edges(jumps);

        self.counts.matched_basic_blocks += 1;
        self.counts.matched_instructions += instructions;
        self.counts.matched_jumps += jumps;

        self.events.publish(DiffEvent::BasicBlockMatchAdded {
            function: function_pair,
            pair,
        });
        self.events.publish(DiffEvent::CountsChanged(self.counts));
        self.check_counters();
        Ok(())
    }

    /// Removes the basic-block match containing `block_primary` from the
    /// function match containing `function_primary`.
    ///
    /// `flow_context`, when present, is the still-merged combined flow-graph
    /// node of the match about to be split; its matched incident edges are
    /// subtracted, which makes removal the exact inverse of
    /// [`add_basic_block_match`](Self::add_basic_block_match).
    ///
    /// Returns `None` without touching any state or publishing anything if the
    /// function or block match does not exist.
    pub fn remove_basic_block_match(
        &mut self,
        function_primary: Address,
        block_primary: Address,
        flow_context: CombinedNodeContext<'_>,
    ) -> Option<BasicBlockMatch> {
        let jumps = matched_incident_edges(flow_context);

        let function = self.functions.get_by_primary_mut(function_primary)?;
        let function_pair = function.address_pair();
        let block = function.remove_basic_block_match(block_primary)?;
        function.remove_flow_edges(jumps);

        self.counts.matched_basic_blocks -= 1;
        self.counts.matched_instructions -= block.matched_instructions();
        self.counts.matched_jumps = self.counts.matched_jumps.saturating_sub(jumps);

        self.events.publish(DiffEvent::BasicBlockMatchRemoved {
            function: function_pair,
            pair: block.address_pair(),
        });
        self.events.publish(DiffEvent::CountsChanged(self.counts));
        self.check_counters();
        Some(block)
    }

    /// Replaces the matched-call total after a call-graph view (re)build or a
    /// structural node deletion.
    ///
    /// Publishes one [`DiffEvent::CountsChanged`] if the value changed.
    pub(crate) fn set_matched_calls(&mut self, calls: u64) {
        if self.counts.matched_calls != calls {
            self.counts.matched_calls = calls;
            self.events.publish(DiffEvent::CountsChanged(self.counts));
        }
    }

    /// Resynchronizes one function match's matched-flow-edge counter with the
    /// value derived from its combined flow view, e.g. after a node deletion
    /// degraded overlay edges.
    ///
    /// Publishes one [`DiffEvent::CountsChanged`] if the value changed.
    pub(crate) fn sync_matched_flow_edges(&mut self, function_primary: Address, count: u64) {
        let Some(function) = self.functions.get_by_primary_mut(function_primary) else {
            return;
        };
        let old = function.matched_flow_edges();
        if old == count {
            return;
        }
        function.restore_flow_edges(count);
        self.counts.matched_jumps = self.counts.matched_jumps - old + count;
        self.events.publish(DiffEvent::CountsChanged(self.counts));
    }

    /// Verifies that the running totals equal the true cardinalities.
    ///
    /// The matched-call total is excluded: it is a property of the combined
    /// call-graph view, not derivable from the match records alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentState`](crate::Error::InconsistentState)
    /// naming the first drifted counter.
    pub fn verify_counters(&self) -> Result<()> {
        let mut expected = DiffCounts {
            matched_calls: self.counts.matched_calls,
            ..DiffCounts::default()
        };
        for function in self.functions.iter() {
            function.verify_counters()?;
            expected.matched_functions += 1;
            expected.changed_functions += u64::from(function.is_changed());
            expected.matched_basic_blocks += function.matched_basic_blocks();
            expected.matched_jumps += function.matched_flow_edges();
            expected.matched_instructions += function.matched_instructions();
        }

        if expected != self.counts {
            return Err(inconsistent_error!(
                "Running totals {:?} != actual cardinalities {:?}",
                self.counts,
                expected
            ));
        }
        Ok(())
    }

    /// Counter check run after every mutation: fatal in debug builds, logged
    /// and repaired in release builds.
    fn check_counters(&mut self) {
        if let Err(error) = self.verify_counters() {
            debug_assert!(false, "match counters drifted: {error}");
            tracing::error!("recovering from counter drift: {error}");
            self.rebuild_counters();
        }
    }

    /// Recomputes the running totals from scratch, keeping the matched-call
    /// total.
    fn rebuild_counters(&mut self) {
        let mut counts = DiffCounts {
            matched_calls: self.counts.matched_calls,
            ..DiffCounts::default()
        };
        for function in self.functions.iter() {
            counts.matched_functions += 1;
            counts.changed_functions += u64::from(function.is_changed());
            counts.matched_basic_blocks += function.matched_basic_blocks();
            counts.matched_jumps += function.matched_flow_edges();
            counts.matched_instructions += function.matched_instructions();
        }
        self.counts = counts;
        self.events.publish(DiffEvent::CountsChanged(self.counts));
    }
}

/// Counts the matched edges incident to the context node, or 0 without context.
fn matched_incident_edges(context: CombinedNodeContext<'_>) -> u64 {
    context.map_or(0, |(graph, node)| graph.matched_incident_edges(node))
}
