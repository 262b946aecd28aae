//! Convenient re-exports of the most commonly used types and traits.

pub use crate::{
    events::{DiffEvent, DiffEventListener, EventQueue},
    graph::{DiffGraph, EdgeId, NodeId},
    matches::{
        Address, AddressPair, BasicBlockMatch, CommentPlacement, CommentStore, Correspondence,
        DiffCounts, FunctionMatch, FunctionMatchFlags, InstructionMatch, MatchAlgorithm, MatchData,
    },
    program::{BasicBlock, CallGraph, FlowEdgeKind, FlowGraph, FunctionNode, Instruction},
    views::{
        CombinedGraph, Diff, GraphsContainer, MatchState, Side, SingleGraph, SuperGraph, ViewKind,
        ViewRole, ViewSettings,
    },
    Error, Result,
};
