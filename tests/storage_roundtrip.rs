//! Integration tests for match persistence.
//!
//! The contract under test: saving a `MatchData` and loading it back yields a
//! model with identical address-pair sets and counters at every granularity,
//! across repeated save/load generations.

use diffscope::prelude::*;
use diffscope::storage;

fn addr(a: u64) -> Address {
    Address::new(a)
}

fn block_match(p: u64, s: u64, algorithm: MatchAlgorithm, instructions: u64) -> BasicBlockMatch {
    let mut block = BasicBlockMatch::new(addr(p), addr(s), algorithm);
    for k in 0..instructions {
        block
            .add_instruction_match(InstructionMatch::new(addr(p + k), addr(s + k)))
            .unwrap();
    }
    block
}

fn sample_model(events: EventQueue) -> Result<MatchData> {
    let mut data = MatchData::new(events);

    let mut main = FunctionMatch::new(
        addr(0x1000),
        addr(0x2000),
        0.95,
        1.0,
        MatchAlgorithm::NameHash,
    );
    main.add_basic_block_match(block_match(0x1010, 0x2010, MatchAlgorithm::EdgesPrimeProduct, 3))?;
    main.add_basic_block_match(block_match(0x1020, 0x2020, MatchAlgorithm::Manual, 2))?;
    data.add_function_match(main, None)?;

    let helper = FunctionMatch::new(
        addr(0x3000),
        addr(0x5000),
        1.0,
        0.8,
        MatchAlgorithm::CallReference,
    )
    .with_flags(FunctionMatchFlags::LIBRARY | FunctionMatchFlags::THUNK);
    data.add_function_match(helper, None)?;
    Ok(data)
}

/// Collects the full address-pair set of a model, at every granularity.
fn pair_sets(data: &MatchData) -> (Vec<AddressPair>, Vec<AddressPair>, Vec<AddressPair>) {
    let mut functions: Vec<AddressPair> =
        data.function_matches().map(|f| f.address_pair()).collect();
    let mut blocks = Vec::new();
    let mut instructions = Vec::new();
    for function in data.function_matches() {
        for block in function.basic_block_matches() {
            blocks.push(block.address_pair());
            for instruction in block.instruction_matches() {
                instructions.push(instruction.address_pair());
            }
        }
    }
    functions.sort();
    blocks.sort();
    instructions.sort();
    (functions, blocks, instructions)
}

#[test]
fn test_roundtrip_preserves_pairs_and_counters() -> Result<()> {
    let data = sample_model(EventQueue::new())?;
    let mut comments = CommentStore::new();
    comments.set(
        AddressPair::matched(addr(0x1000), addr(0x2000)),
        CommentPlacement::Combined,
        "hot path",
    );
    comments.set(
        AddressPair::primary_only(addr(0x4000)),
        CommentPlacement::Primary,
        "dead in v2",
    );

    let mut conn = storage::open_in_memory()?;
    storage::save(&mut conn, &data, &comments)?;
    let (loaded, loaded_comments) = storage::load(&conn, EventQueue::new())?;

    assert_eq!(loaded.counts(), data.counts());
    assert_eq!(pair_sets(&loaded), pair_sets(&data));
    loaded.verify_counters()?;

    // Per-function counters survive at every granularity.
    let main = loaded.function_by_primary(addr(0x1000)).unwrap();
    assert_eq!(main.matched_basic_blocks(), 2);
    assert_eq!(main.matched_instructions(), 5);
    assert_eq!(main.similarity(), 0.95);
    let helper = loaded.function_by_primary(addr(0x3000)).unwrap();
    assert_eq!(
        helper.flags(),
        FunctionMatchFlags::LIBRARY | FunctionMatchFlags::THUNK
    );

    assert_eq!(loaded_comments.len(), 2);
    assert_eq!(
        loaded_comments.get(
            AddressPair::primary_only(addr(0x4000)),
            CommentPlacement::Primary
        ),
        Some("dead in v2")
    );
    Ok(())
}

#[test]
fn test_roundtrip_is_stable_across_generations() -> Result<()> {
    let data = sample_model(EventQueue::new())?;
    let comments = CommentStore::new();

    let mut conn = storage::open_in_memory()?;
    storage::save(&mut conn, &data, &comments)?;
    let (first, first_comments) = storage::load(&conn, EventQueue::new())?;

    storage::save(&mut conn, &first, &first_comments)?;
    let (second, _) = storage::load(&conn, EventQueue::new())?;

    assert_eq!(second.counts(), data.counts());
    assert_eq!(pair_sets(&second), pair_sets(&data));
    Ok(())
}

#[test]
fn test_uniqueness_survives_load() -> Result<()> {
    let data = sample_model(EventQueue::new())?;
    let mut conn = storage::open_in_memory()?;
    storage::save(&mut conn, &data, &CommentStore::new())?;
    let (mut loaded, _) = storage::load(&conn, EventQueue::new())?;

    // Both sides of every loaded pair still refuse duplicates.
    let result = loaded.add_function_match(
        FunctionMatch::new(addr(0x1000), addr(0x9999), 1.0, 1.0, MatchAlgorithm::Manual),
        None,
    );
    assert!(matches!(result, Err(Error::DuplicateMatch(_))));
    let result = loaded.add_function_match(
        FunctionMatch::new(addr(0x9999), addr(0x2000), 1.0, 1.0, MatchAlgorithm::Manual),
        None,
    );
    assert!(matches!(result, Err(Error::DuplicateMatch(_))));
    Ok(())
}

#[test]
fn test_removal_then_roundtrip_drops_cascade() -> Result<()> {
    let mut data = sample_model(EventQueue::new())?;
    data.remove_function_match(addr(0x1000), None).unwrap();

    let mut conn = storage::open_in_memory()?;
    storage::save(&mut conn, &data, &CommentStore::new())?;
    let (loaded, _) = storage::load(&conn, EventQueue::new())?;

    assert_eq!(loaded.function_match_count(), 1);
    assert!(loaded.function_by_primary(addr(0x1000)).is_none());
    assert!(loaded
        .get_basic_block_match(addr(0x1000), addr(0x1010))
        .is_none());
    assert_eq!(loaded.counts().matched_basic_blocks, 0);
    assert_eq!(loaded.counts().matched_instructions, 0);
    Ok(())
}
