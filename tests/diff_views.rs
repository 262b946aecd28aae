//! Integration tests for the synchronized view layer.
//!
//! These tests drive the public API the way a UI would:
//! 1. Build two small raw programs by hand
//! 2. Record function matches in a `MatchData`
//! 3. Open call-graph and flow-graph views through a `Diff`
//! 4. Edit matches, selections and proximity at runtime
//! 5. Verify counters, events and cross-view invariants after every step

use diffscope::prelude::*;

fn addr(a: u64) -> Address {
    Address::new(a)
}

/// Builds a linear flow graph of `blocks` basic blocks with `instrs`
/// instructions each, starting at `base` with 0x10 spacing.
fn flow_chain(base: u64, blocks: u64, instrs: u64) -> FlowGraph {
    let mut flow = FlowGraph::new();
    for i in 0..blocks {
        let block = base + i * 0x10;
        let instructions = (0..instrs)
            .map(|k| Instruction::new(addr(block + k), "mov"))
            .collect();
        flow.add_block(BasicBlock::new(addr(block), instructions)).unwrap();
    }
    for i in 1..blocks {
        flow.add_edge(
            addr(base + (i - 1) * 0x10),
            addr(base + i * 0x10),
            FlowEdgeKind::Unconditional,
        )
        .unwrap();
    }
    flow
}

/// Two programs: `main` and `helper` exist on both sides (main calls helper),
/// plus one unmatched function per side.
fn programs() -> (CallGraph, CallGraph) {
    let mut primary = CallGraph::new();
    primary
        .add_function(FunctionNode::with_flow_graph(
            addr(0x1000),
            "main",
            flow_chain(0x1000, 3, 3),
        ))
        .unwrap();
    primary
        .add_function(FunctionNode::with_flow_graph(
            addr(0x3000),
            "helper",
            flow_chain(0x3000, 1, 2),
        ))
        .unwrap();
    primary
        .add_function(FunctionNode::new(addr(0x4000), "orphan"))
        .unwrap();
    primary.add_call(addr(0x1000), addr(0x3000)).unwrap();

    let mut secondary = CallGraph::new();
    secondary
        .add_function(FunctionNode::with_flow_graph(
            addr(0x2000),
            "main",
            flow_chain(0x2000, 3, 3),
        ))
        .unwrap();
    secondary
        .add_function(FunctionNode::with_flow_graph(
            addr(0x5000),
            "helper",
            flow_chain(0x5000, 1, 2),
        ))
        .unwrap();
    secondary
        .add_function(FunctionNode::new(addr(0x6000), "extra"))
        .unwrap();
    secondary.add_call(addr(0x2000), addr(0x5000)).unwrap();

    (primary, secondary)
}

/// A diff session with `main` and `helper` matched.
fn diff_with_matches() -> Result<Diff> {
    let (primary, secondary) = programs();
    let events = EventQueue::new();
    let mut matches = MatchData::new(events.clone());
    matches.add_function_match(
        FunctionMatch::new(addr(0x1000), addr(0x2000), 1.0, 1.0, MatchAlgorithm::NameHash),
        None,
    )?;
    matches.add_function_match(
        FunctionMatch::new(
            addr(0x3000),
            addr(0x5000),
            0.8,
            0.9,
            MatchAlgorithm::CallReference,
        ),
        None,
    )?;
    Ok(Diff::new(
        primary,
        secondary,
        matches,
        CommentStore::new(),
        ViewSettings::default(),
        events,
    ))
}

fn block_match(p: u64, s: u64, instructions: u64) -> BasicBlockMatch {
    let mut block = BasicBlockMatch::new(addr(p), addr(s), MatchAlgorithm::Manual);
    for k in 0..instructions {
        block
            .add_instruction_match(InstructionMatch::new(addr(p + k), addr(s + k)))
            .unwrap();
    }
    block
}

const MAIN_PAIR: (u64, u64) = (0x1000, 0x2000);

fn main_pair() -> AddressPair {
    AddressPair::matched(addr(MAIN_PAIR.0), addr(MAIN_PAIR.1))
}

#[test]
fn test_call_graph_build_consistency() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_call_graph_view()?;

    // main -> helper exists on both sides between matched functions.
    assert_eq!(diff.matches().counts().matched_calls, 1);

    let view = diff.call_graph_view().unwrap();
    // Two matched positions plus one unmatched per side.
    assert_eq!(view.combined().node_count(), 4);
    assert_eq!(view.super_graph().node_count(), 4);

    let main = view.combined().node_by_pair(main_pair()).unwrap();
    assert!(view.combined().node(main).unwrap().is_matched());
    assert!(view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x4000)))
        .is_some());
    assert!(view
        .combined()
        .node_by_pair(AddressPair::secondary_only(addr(0x6000)))
        .is_some());

    view.verify_consistency(diff.matches())?;
    Ok(())
}

#[test]
fn test_basic_block_match_lifecycle() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_flow_view(addr(0x1000))?;
    let _ = diff.drain_events();

    diff.add_basic_block_match(addr(0x1000), block_match(0x1010, 0x2010, 3))?;
    diff.add_basic_block_match(addr(0x1000), block_match(0x1020, 0x2020, 3))?;

    let counts = diff.matches().counts();
    assert_eq!(counts.matched_basic_blocks, 2);
    assert_eq!(counts.matched_instructions, 6);
    // 0x1010 -> 0x1020 now exists on both sides between matched blocks.
    assert_eq!(counts.matched_jumps, 1);

    {
        let view = diff.flow_view(main_pair()).unwrap();
        let merged = view
            .combined()
            .node_by_pair(AddressPair::matched(addr(0x1010), addr(0x2010)))
            .unwrap();
        assert!(view.combined().node(merged).unwrap().is_matched());
        view.verify_consistency(diff.matches())?;
    }

    let removed = diff.remove_basic_block_match(addr(0x1000), addr(0x1010))?;
    assert!(removed.is_some());

    let counts = diff.matches().counts();
    assert_eq!(counts.matched_basic_blocks, 1);
    assert_eq!(counts.matched_instructions, 3);
    assert_eq!(counts.matched_jumps, 0);

    // The position split into two unmatched nodes, one per side.
    let view = diff.flow_view(main_pair()).unwrap();
    assert!(view
        .combined()
        .node_by_pair(AddressPair::matched(addr(0x1010), addr(0x2010)))
        .is_none());
    let cp = view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x1010)))
        .unwrap();
    let cs = view
        .combined()
        .node_by_pair(AddressPair::secondary_only(addr(0x2010)))
        .unwrap();
    assert!(!view.combined().node(cp).unwrap().is_matched());
    assert!(!view.combined().node(cs).unwrap().is_matched());
    view.verify_consistency(diff.matches())?;
    diff.matches().verify_counters()?;
    Ok(())
}

#[test]
fn test_add_remove_cycles_restore_counters_and_structure() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_flow_view(addr(0x1000))?;

    let before = diff.matches().counts();
    let (nodes_before, edges_before) = {
        let view = diff.flow_view(main_pair()).unwrap();
        (view.combined().node_count(), view.combined().edge_count())
    };

    for _ in 0..8 {
        diff.add_basic_block_match(addr(0x1000), block_match(0x1010, 0x2010, 3))?;
        assert!(diff
            .remove_basic_block_match(addr(0x1000), addr(0x1010))?
            .is_some());
    }

    assert_eq!(diff.matches().counts(), before);
    let view = diff.flow_view(main_pair()).unwrap();
    assert_eq!(view.combined().node_count(), nodes_before);
    assert_eq!(view.combined().edge_count(), edges_before);
    assert_eq!(view.super_graph().node_count(), nodes_before);
    assert_eq!(view.super_graph().edge_count(), edges_before);
    view.verify_consistency(diff.matches())?;
    diff.matches().verify_counters()?;
    Ok(())
}

#[test]
fn test_mutations_notify_exactly_once() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_flow_view(addr(0x1000))?;
    let _ = diff.drain_events();

    diff.add_basic_block_match(addr(0x1000), block_match(0x1010, 0x2010, 2))?;
    let events = diff.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DiffEvent::BasicBlockMatchAdded { .. }));
    assert!(matches!(events[1], DiffEvent::CountsChanged(_)));

    // Removing a non-existent match is a silent no-op.
    assert!(diff
        .remove_basic_block_match(addr(0x1000), addr(0x9999))?
        .is_none());
    assert!(diff.drain_events().is_empty());
    Ok(())
}

#[test]
fn test_duplicate_match_leaves_views_untouched() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_call_graph_view()?;

    let (nodes, edges) = {
        let view = diff.call_graph_view().unwrap();
        (view.combined().node_count(), view.combined().edge_count())
    };
    let before = diff.matches().counts();

    // 0x1000 is already matched; the add must fail without touching anything.
    let result = diff.add_function_match(FunctionMatch::new(
        addr(0x1000),
        addr(0x6000),
        0.2,
        0.2,
        MatchAlgorithm::Manual,
    ));
    assert!(matches!(result, Err(Error::DuplicateMatch(_))));

    assert_eq!(diff.matches().counts(), before);
    let view = diff.call_graph_view().unwrap();
    assert_eq!(view.combined().node_count(), nodes);
    assert_eq!(view.combined().edge_count(), edges);
    view.verify_consistency(diff.matches())?;
    Ok(())
}

#[test]
fn test_runtime_function_match_edit() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_call_graph_view()?;

    diff.add_function_match(FunctionMatch::new(
        addr(0x4000),
        addr(0x6000),
        0.5,
        0.4,
        MatchAlgorithm::Manual,
    ))?;
    assert_eq!(diff.matches().counts().matched_functions, 3);
    {
        let view = diff.call_graph_view().unwrap();
        assert!(view
            .combined()
            .node_by_pair(AddressPair::matched(addr(0x4000), addr(0x6000)))
            .is_some());
        view.verify_consistency(diff.matches())?;
    }

    // Removing the helper match unmatches the main -> helper call.
    let removed = diff.remove_function_match(addr(0x3000))?;
    assert!(removed.is_some());
    let counts = diff.matches().counts();
    assert_eq!(counts.matched_functions, 2);
    assert_eq!(counts.matched_calls, 0);

    let view = diff.call_graph_view().unwrap();
    assert!(view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x3000)))
        .is_some());
    assert!(view
        .combined()
        .node_by_pair(AddressPair::secondary_only(addr(0x5000)))
        .is_some());
    view.verify_consistency(diff.matches())?;
    Ok(())
}

#[test]
fn test_selection_broadcast_and_history() -> Result<()> {
    let mut diff = diff_with_matches()?;
    let view = diff.open_call_graph_view()?;

    let p_main = view.primary().node_id(addr(0x1000)).unwrap();
    view.select_nodes(ViewRole::Primary, &[p_main], &[])?;

    let node = view.primary().node(p_main).unwrap();
    assert!(node.is_selected());
    let c_id = node.combined().unwrap();
    let su_id = node.super_node().unwrap();
    assert!(view.combined().node(c_id).unwrap().is_selected());
    assert!(view.super_graph().node(su_id).unwrap().is_selected());
    let s_main = view.secondary().node_id(addr(0x2000)).unwrap();
    assert!(view.secondary().node(s_main).unwrap().is_selected());

    // Deselection propagates symmetrically.
    view.select_nodes(ViewRole::Primary, &[], &[p_main])?;
    assert!(!view.primary().node(p_main).unwrap().is_selected());
    assert!(!view.combined().node(c_id).unwrap().is_selected());
    assert!(!view.super_graph().node(su_id).unwrap().is_selected());

    // Undo restores the selection, broadcast included, without recording a
    // new history entry.
    assert!(view.undo_selection(ViewRole::Primary)?);
    assert!(view.primary().node(p_main).unwrap().is_selected());
    assert!(view.combined().node(c_id).unwrap().is_selected());
    assert!(view.super_graph().node(su_id).unwrap().is_selected());

    assert!(view.redo_selection(ViewRole::Primary)?);
    assert!(!view.primary().node(p_main).unwrap().is_selected());
    assert!(!view.combined().node(c_id).unwrap().is_selected());

    // Nothing more to redo.
    assert!(!view.redo_selection(ViewRole::Primary)?);
    Ok(())
}

#[test]
fn test_container_proximity_expand_and_recollapse() -> Result<()> {
    let mut diff = diff_with_matches()?;
    let view = diff.open_flow_view(addr(0x1000))?;

    view.set_proximity_enabled(ViewRole::Combined, true)?;
    view.set_proximity_depths(ViewRole::Combined, 1, 1)?;

    let entry = view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x1000)))
        .unwrap();
    view.focus_view(ViewRole::Combined, &[entry])?;

    // Entry plus one child visible; the chain tail is folded behind a proxy.
    let tail = view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x1020)))
        .unwrap();
    assert!(!view.combined().node(tail).unwrap().is_visible());
    let visible_after_focus = view.combined().visible_nodes();
    let find_proxy = |view: &GraphsContainer| {
        view.combined()
            .node_ids()
            .find(|&id| view.combined().node(id).is_some_and(|n| n.proxy().is_some()))
    };
    let proxy = find_proxy(view).unwrap();

    // Expanding the proxy unhides exactly its neighborhood.
    view.delete_proximity_node(ViewRole::Combined, proxy)?;
    assert!(view.combined().node(tail).unwrap().is_visible());
    assert!(find_proxy(view).is_none());

    // Re-collapsing at the same depth from the same anchor restores the fold.
    view.focus_view(ViewRole::Combined, &[entry])?;
    assert!(!view.combined().node(tail).unwrap().is_visible());
    assert_eq!(view.combined().visible_nodes(), visible_after_focus);
    assert!(find_proxy(view).is_some());
    Ok(())
}

#[test]
fn test_frozen_proximity_ignores_selection() -> Result<()> {
    let mut diff = diff_with_matches()?;
    let view = diff.open_flow_view(addr(0x1000))?;

    view.set_proximity_enabled(ViewRole::Combined, true)?;
    view.set_proximity_depths(ViewRole::Combined, 1, 1)?;
    let entry = view
        .combined()
        .node_by_pair(AddressPair::primary_only(addr(0x1000)))
        .unwrap();
    view.focus_view(ViewRole::Combined, &[entry])?;
    let visible_before: Vec<_> = view.combined().visible_nodes();

    view.set_proximity_frozen(ViewRole::Combined, true)?;
    let far = view
        .combined()
        .node_by_pair(AddressPair::secondary_only(addr(0x2020)))
        .unwrap();
    view.select_nodes(ViewRole::Combined, &[far], &[])?;

    // Frozen: no automatic re-collapse around the new selection.
    assert_eq!(view.combined().visible_nodes(), visible_before);

    // Unfrozen: the next selection change re-centers visibility.
    view.set_proximity_frozen(ViewRole::Combined, false)?;
    view.select_nodes(ViewRole::Combined, &[], &[])?;
    assert!(view
        .combined()
        .node(far)
        .is_some_and(|n| n.is_visible()));
    Ok(())
}

#[test]
fn test_delete_node_degrades_or_removes_counterpart() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_call_graph_view()?;

    let s_helper = {
        let view = diff.call_graph_view().unwrap();
        view.secondary().node_id(addr(0x5000)).unwrap()
    };
    diff.delete_call_graph_node(Side::Secondary, s_helper)?;

    {
        let view = diff.call_graph_view().unwrap();
        // The matched position degraded to one-sided instead of vanishing.
        assert!(view
            .combined()
            .node_by_pair(AddressPair::matched(addr(0x3000), addr(0x5000)))
            .is_none());
        let degraded = view
            .combined()
            .node_by_pair(AddressPair::primary_only(addr(0x3000)))
            .unwrap();
        assert!(!view.combined().node(degraded).unwrap().is_matched());
        view.verify_consistency(diff.matches())?;
    }
    // The matched call edge went one-sided with it.
    assert_eq!(diff.matches().counts().matched_calls, 0);

    // Deleting a node with no counterpart removes its position entirely.
    let s_extra = {
        let view = diff.call_graph_view().unwrap();
        view.secondary().node_id(addr(0x6000)).unwrap()
    };
    diff.delete_call_graph_node(Side::Secondary, s_extra)?;
    let view = diff.call_graph_view().unwrap();
    assert!(view
        .combined()
        .node_by_pair(AddressPair::secondary_only(addr(0x6000)))
        .is_none());
    view.verify_consistency(diff.matches())?;
    Ok(())
}

#[test]
fn test_unmatched_function_opens_one_sided_flow_view() -> Result<()> {
    let mut diff = diff_with_matches()?;
    let view = diff.open_flow_view(addr(0x4000))?;

    // No flow graph was exported for the orphan; the view is empty but valid.
    assert_eq!(view.kind(), ViewKind::FlowGraph {
        function: AddressPair::primary_only(addr(0x4000))
    });
    assert_eq!(view.combined().node_count(), 0);
    Ok(())
}

#[test]
fn test_removing_function_match_closes_its_flow_view() -> Result<()> {
    let mut diff = diff_with_matches()?;
    diff.open_flow_view(addr(0x1000))?;
    assert!(diff.flow_view(main_pair()).is_some());

    diff.remove_function_match(addr(0x1000))?;
    assert!(diff.flow_view(main_pair()).is_none());
    Ok(())
}
