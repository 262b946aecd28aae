//! Per-function control flow graph over raw basic blocks.
//!
//! A [`FlowGraph`] wraps an arena graph of [`BasicBlock`]s with address-keyed
//! lookup and typed edges. It is the raw input from which the flow-graph diff
//! views are built.

use std::collections::HashMap;
use std::fmt::Write;

use crate::{
    graph::{DiffGraph, EdgeId, NodeId},
    matches::Address,
    program::BasicBlock,
    Error::GraphError,
    Result,
};

/// The kind of control flow represented by an edge.
///
/// Mirrors the classification the exporter attaches to flow edges. The diff
/// views carry the kind through to the UI unchanged; none of the match or
/// synchronization logic depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEdgeKind {
    /// Unconditional control flow (direct jump or fall-through).
    Unconditional,
    /// The "true" branch of a conditional.
    ConditionalTrue,
    /// The "false" branch of a conditional (fall-through).
    ConditionalFalse,
    /// A switch case edge.
    Switch,
}

impl FlowEdgeKind {
    /// Returns `true` if this is a conditional branch edge.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::ConditionalTrue | Self::ConditionalFalse)
    }
}

/// A control flow graph for one function on one side of the diff.
///
/// Blocks are addressed by their first instruction address; the graph offers
/// O(1) lookup by address, iteration over blocks and typed edges, and an edge
/// existence query used when pairing edges across the two sides.
///
/// # Construction
///
/// The loader (or a test) builds the graph incrementally:
///
/// ```rust
/// use diffscope::matches::Address;
/// use diffscope::program::{BasicBlock, FlowEdgeKind, FlowGraph, Instruction};
///
/// let mut flow = FlowGraph::new();
/// flow.add_block(BasicBlock::new(
///     Address::new(0x1000),
///     vec![Instruction::new(Address::new(0x1000), "jnz")],
/// ))?;
/// flow.add_block(BasicBlock::new(
///     Address::new(0x1010),
///     vec![Instruction::new(Address::new(0x1010), "ret")],
/// ))?;
/// flow.add_edge(
///     Address::new(0x1000),
///     Address::new(0x1010),
///     FlowEdgeKind::ConditionalTrue,
/// )?;
///
/// assert_eq!(flow.block_count(), 2);
/// # Ok::<(), diffscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    /// The underlying arena graph of basic blocks.
    graph: DiffGraph<BasicBlock, FlowEdgeKind>,
    /// Map from block address to node ID for O(1) lookup.
    by_address: HashMap<Address, NodeId>,
    /// The entry block, which is the first block added.
    entry: Option<NodeId>,
}

impl FlowGraph {
    /// Creates a new empty flow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a basic block.
    ///
    /// The first block added becomes the entry block.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if a block with the same address already exists.
    pub fn add_block(&mut self, block: BasicBlock) -> Result<NodeId> {
        let address = block.address;
        if self.by_address.contains_key(&address) {
            return Err(GraphError(format!(
                "Flow graph already contains a block at {address}"
            )));
        }

        let id = self.graph.add_node(block);
        self.by_address.insert(address, id);
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        Ok(id)
    }

    /// Adds a typed flow edge between two blocks identified by address.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if either endpoint address is unknown.
    pub fn add_edge(&mut self, from: Address, to: Address, kind: FlowEdgeKind) -> Result<EdgeId> {
        let source = self.node_id(from).ok_or_else(|| {
            GraphError(format!("Flow edge source {from} is not a known block"))
        })?;
        let target = self
            .node_id(to)
            .ok_or_else(|| GraphError(format!("Flow edge target {to} is not a known block")))?;
        self.graph.add_edge(source, target, kind)
    }

    /// Returns the node ID of the block at the given address.
    #[must_use]
    pub fn node_id(&self, address: Address) -> Option<NodeId> {
        self.by_address.get(&address).copied()
    }

    /// Returns the block at the given address.
    #[must_use]
    pub fn block_at(&self, address: Address) -> Option<&BasicBlock> {
        self.node_id(address).and_then(|id| self.graph.node(id))
    }

    /// Returns the block with the given node ID.
    #[must_use]
    pub fn block(&self, id: NodeId) -> Option<&BasicBlock> {
        self.graph.node(id)
    }

    /// Returns the entry block ID, or `None` for an empty graph.
    #[must_use]
    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    /// Returns an iterator over all blocks, in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.graph.node_ids().filter_map(|id| self.graph.node(id))
    }

    /// Returns an iterator over all edges as `(from, to, kind)` address triples.
    pub fn edges(&self) -> impl Iterator<Item = (Address, Address, FlowEdgeKind)> + '_ {
        self.graph.edge_ids().filter_map(|e| {
            let (source, target) = self.graph.edge_endpoints(e)?;
            let kind = *self.graph.edge(e)?;
            Some((self.graph.node(source)?.address, self.graph.node(target)?.address, kind))
        })
    }

    /// Returns `true` if an edge between the two block addresses exists.
    #[must_use]
    pub fn has_edge(&self, from: Address, to: Address) -> bool {
        let (Some(source), Some(target)) = (self.node_id(from), self.node_id(to)) else {
            return false;
        };
        self.graph.successors(source).any(|s| s == target)
    }

    /// Returns the successor block addresses of the given block address.
    pub fn successors_of(&self, address: Address) -> impl Iterator<Item = Address> + '_ {
        self.node_id(address)
            .into_iter()
            .flat_map(|id| self.graph.successors(id))
            .filter_map(|s| self.graph.node(s).map(|b| b.address))
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of flow edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the total number of instructions across all blocks.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.blocks().map(BasicBlock::instruction_count).sum()
    }

    /// Renders the flow graph in Graphviz DOT format for debugging.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph flow {\n");
        for block in self.blocks() {
            let _ = writeln!(
                out,
                "  \"{}\" [label=\"{} ({} instrs)\"];",
                block.address,
                block.address,
                block.instruction_count()
            );
        }
        for (from, to, kind) in self.edges() {
            let _ = writeln!(out, "  \"{from}\" -> \"{to}\" [label=\"{kind:?}\"];");
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Instruction;

    fn simple_graph() -> FlowGraph {
        let mut flow = FlowGraph::new();
        for (addr, mnemonic) in [(0x1000u64, "jnz"), (0x1010, "mov"), (0x1020, "ret")] {
            flow.add_block(BasicBlock::new(
                Address::new(addr),
                vec![Instruction::new(Address::new(addr), mnemonic)],
            ))
            .unwrap();
        }
        flow.add_edge(
            Address::new(0x1000),
            Address::new(0x1010),
            FlowEdgeKind::ConditionalTrue,
        )
        .unwrap();
        flow.add_edge(
            Address::new(0x1000),
            Address::new(0x1020),
            FlowEdgeKind::ConditionalFalse,
        )
        .unwrap();
        flow
    }

    #[test]
    fn test_build_and_lookup() {
        let flow = simple_graph();
        assert_eq!(flow.block_count(), 3);
        assert_eq!(flow.edge_count(), 2);
        assert_eq!(flow.instruction_count(), 3);
        assert!(flow.block_at(Address::new(0x1010)).is_some());
        assert!(flow.block_at(Address::new(0x9999)).is_none());
        assert_eq!(flow.entry(), flow.node_id(Address::new(0x1000)));
    }

    #[test]
    fn test_duplicate_block_rejected() {
        let mut flow = simple_graph();
        let result = flow.add_block(BasicBlock::new(Address::new(0x1000), Vec::new()));
        assert!(result.is_err());
        assert_eq!(flow.block_count(), 3);
    }

    #[test]
    fn test_has_edge() {
        let flow = simple_graph();
        assert!(flow.has_edge(Address::new(0x1000), Address::new(0x1010)));
        assert!(!flow.has_edge(Address::new(0x1010), Address::new(0x1000)));
        assert!(!flow.has_edge(Address::new(0x1000), Address::new(0x9999)));
    }

    #[test]
    fn test_edge_to_unknown_block_rejected() {
        let mut flow = simple_graph();
        let result = flow.add_edge(
            Address::new(0x1000),
            Address::new(0x9999),
            FlowEdgeKind::Unconditional,
        );
        assert!(result.is_err());
        assert_eq!(flow.edge_count(), 2);
    }
}
