//! Per-side call graph over raw functions.
//!
//! A [`CallGraph`] holds one side's functions and their call relationships. Each
//! function node may carry its [`FlowGraph`]; a missing flow graph means the
//! loader was cancelled before exporting that function's body, which the view
//! layer must tolerate.

use std::collections::HashMap;
use std::fmt::Write;

use crate::{
    graph::{DiffGraph, EdgeId, NodeId},
    matches::{Address, MatchData},
    program::FlowGraph,
    views::Side,
    Error::GraphError,
    Result,
};

/// A function on one side of the diff.
#[derive(Debug, Clone)]
pub struct FunctionNode {
    /// The entry address of the function.
    pub address: Address,
    /// The demangled name, or a synthesized `sub_...` name.
    pub name: String,
    /// The function's control flow graph, if the loader exported one.
    pub flow_graph: Option<FlowGraph>,
}

impl FunctionNode {
    /// Creates a new function node without a flow graph.
    #[must_use]
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            flow_graph: None,
        }
    }

    /// Creates a new function node carrying its flow graph.
    #[must_use]
    pub fn with_flow_graph(address: Address, name: impl Into<String>, flow: FlowGraph) -> Self {
        Self {
            address,
            name: name.into(),
            flow_graph: Some(flow),
        }
    }
}

/// The call graph of one side of the diff.
///
/// Functions are keyed by entry address. The graph offers the same read surface
/// as [`FlowGraph`](crate::program::FlowGraph): O(1) address lookup, edge
/// iteration with endpoint addresses, and an edge existence query for pairing
/// call edges across the two sides.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    /// The underlying arena graph: nodes are functions, edges are calls.
    graph: DiffGraph<FunctionNode, ()>,
    /// Map from function address to node ID for O(1) lookup.
    by_address: HashMap<Address, NodeId>,
}

impl CallGraph {
    /// Creates a new empty call graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if a function with the same address already exists.
    pub fn add_function(&mut self, function: FunctionNode) -> Result<NodeId> {
        let address = function.address;
        if self.by_address.contains_key(&address) {
            return Err(GraphError(format!(
                "Call graph already contains a function at {address}"
            )));
        }

        let id = self.graph.add_node(function);
        self.by_address.insert(address, id);
        Ok(id)
    }

    /// Adds a call edge between two functions identified by address.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if either endpoint address is unknown.
    pub fn add_call(&mut self, caller: Address, callee: Address) -> Result<EdgeId> {
        let source = self.node_id(caller).ok_or_else(|| {
            GraphError(format!("Call source {caller} is not a known function"))
        })?;
        let target = self.node_id(callee).ok_or_else(|| {
            GraphError(format!("Call target {callee} is not a known function"))
        })?;
        self.graph.add_edge(source, target, ())
    }

    /// Returns the node ID of the function at the given address.
    #[must_use]
    pub fn node_id(&self, address: Address) -> Option<NodeId> {
        self.by_address.get(&address).copied()
    }

    /// Returns the function at the given address.
    #[must_use]
    pub fn function_at(&self, address: Address) -> Option<&FunctionNode> {
        self.node_id(address).and_then(|id| self.graph.node(id))
    }

    /// Returns the function with the given node ID.
    #[must_use]
    pub fn function(&self, id: NodeId) -> Option<&FunctionNode> {
        self.graph.node(id)
    }

    /// Returns an iterator over all functions, in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> + '_ {
        self.graph.node_ids().filter_map(|id| self.graph.node(id))
    }

    /// Returns an iterator over all call edges as `(caller, callee)` address pairs.
    pub fn calls(&self) -> impl Iterator<Item = (Address, Address)> + '_ {
        self.graph.edge_ids().filter_map(|e| {
            let (source, target) = self.graph.edge_endpoints(e)?;
            Some((self.graph.node(source)?.address, self.graph.node(target)?.address))
        })
    }

    /// Returns `true` if a call edge between the two function addresses exists.
    #[must_use]
    pub fn has_call(&self, caller: Address, callee: Address) -> bool {
        let (Some(source), Some(target)) = (self.node_id(caller), self.node_id(callee)) else {
            return false;
        };
        self.graph.successors(source).any(|s| s == target)
    }

    /// Returns `true` if the function at `address` has a recorded counterpart in
    /// the match model, interpreting this graph as the given side.
    #[must_use]
    pub fn is_matched(&self, address: Address, matches: &MatchData, side: Side) -> bool {
        if !self.by_address.contains_key(&address) {
            return false;
        }
        match side {
            Side::Primary => matches.function_by_primary(address).is_some(),
            Side::Secondary => matches.function_by_secondary(address).is_some(),
        }
    }

    /// Returns the number of functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of call edges.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Renders the call graph in Graphviz DOT format for debugging.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph calls {\n");
        for function in self.functions() {
            let _ = writeln!(
                out,
                "  \"{}\" [label=\"{}\"];",
                function.address, function.name
            );
        }
        for (caller, callee) in self.calls() {
            let _ = writeln!(out, "  \"{caller}\" -> \"{callee}\";");
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_graph() -> CallGraph {
        let mut calls = CallGraph::new();
        calls
            .add_function(FunctionNode::new(Address::new(0x1000), "main"))
            .unwrap();
        calls
            .add_function(FunctionNode::new(Address::new(0x2000), "helper"))
            .unwrap();
        calls
            .add_call(Address::new(0x1000), Address::new(0x2000))
            .unwrap();
        calls
    }

    #[test]
    fn test_build_and_lookup() {
        let calls = simple_graph();
        assert_eq!(calls.function_count(), 2);
        assert_eq!(calls.call_count(), 1);
        assert_eq!(
            calls.function_at(Address::new(0x1000)).map(|f| f.name.as_str()),
            Some("main")
        );
    }

    #[test]
    fn test_duplicate_function_rejected() {
        let mut calls = simple_graph();
        assert!(calls
            .add_function(FunctionNode::new(Address::new(0x1000), "dup"))
            .is_err());
        assert_eq!(calls.function_count(), 2);
    }

    #[test]
    fn test_has_call() {
        let calls = simple_graph();
        assert!(calls.has_call(Address::new(0x1000), Address::new(0x2000)));
        assert!(!calls.has_call(Address::new(0x2000), Address::new(0x1000)));
    }
}
