use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use diffscope::prelude::*;

fn addr(a: u64) -> Address {
    Address::new(a)
}

/// Builds one side: `functions` functions in a call chain, each with a linear
/// flow graph of eight three-instruction blocks.
fn program(base: u64, functions: u64) -> CallGraph {
    let mut calls = CallGraph::new();
    for i in 0..functions {
        let entry = base + i * 0x1000;
        let mut flow = FlowGraph::new();
        for b in 0..8u64 {
            let block = entry + b * 0x10;
            let instructions = (0..3).map(|k| Instruction::new(addr(block + k), "mov")).collect();
            flow.add_block(BasicBlock::new(addr(block), instructions)).unwrap();
            if b > 0 {
                flow.add_edge(
                    addr(entry + (b - 1) * 0x10),
                    addr(block),
                    FlowEdgeKind::Unconditional,
                )
                .unwrap();
            }
        }
        calls
            .add_function(FunctionNode::with_flow_graph(
                addr(entry),
                format!("f{i}"),
                flow,
            ))
            .unwrap();
        if i > 0 {
            calls
                .add_call(addr(base + (i - 1) * 0x1000), addr(entry))
                .unwrap();
        }
    }
    calls
}

fn matched_model(functions: u64, events: EventQueue) -> MatchData {
    let mut data = MatchData::new(events);
    for i in 0..functions {
        data.add_function_match(
            FunctionMatch::new(
                addr(0x10_0000 + i * 0x1000),
                addr(0x80_0000 + i * 0x1000),
                1.0,
                1.0,
                MatchAlgorithm::AddressSequence,
            ),
            None,
        )
        .unwrap();
    }
    data
}

fn bench_build_call_graph_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_call_graph_views");
    for functions in [100u64, 1000] {
        let primary = program(0x10_0000, functions);
        let secondary = program(0x80_0000, functions);
        let events = EventQueue::new();
        let matches = matched_model(functions, events.clone());
        let settings = ViewSettings::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(functions),
            &functions,
            |b, _| {
                b.iter(|| {
                    GraphsContainer::build_call_graph(
                        &primary,
                        &secondary,
                        &matches,
                        &settings,
                        events.clone(),
                    )
                    .unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_build_call_graph_views);
criterion_main!(benches);
