//! SQLite persistence of the match model and comments.
//!
//! One diff's results live in a single database file with four tables:
//! `function`, `basicblock` and `instruction` hold the match records at their
//! three granularities, `comment` is the key-value store of user comments.
//!
//! [`save`] writes everything inside one transaction; a failed save rolls back
//! and leaves both the file and the in-memory model untouched. [`load`]
//! rebuilds an equivalent [`MatchData`]: identical address-pair sets and
//! counters at every granularity (the persisted counter columns are
//! cross-checked against recomputed sums and a mismatch is reported as
//! [`Error::CorruptDatabase`](crate::Error::CorruptDatabase) instead of being
//! trusted).

use std::path::Path;
use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::{
    events::EventQueue,
    matches::{
        Address, AddressPair, BasicBlockMatch, CommentPlacement, CommentStore, Correspondence,
        FunctionMatch, FunctionMatchFlags, InstructionMatch, MatchAlgorithm, MatchData,
    },
    Error::CorruptDatabase,
    Result,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS function (
    id INTEGER PRIMARY KEY,
    address1 INTEGER NOT NULL UNIQUE,
    address2 INTEGER NOT NULL UNIQUE,
    similarity REAL NOT NULL,
    confidence REAL NOT NULL,
    flags INTEGER NOT NULL,
    algorithm TEXT NOT NULL,
    basicblocks INTEGER NOT NULL,
    edges INTEGER NOT NULL,
    instructions INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS basicblock (
    id INTEGER PRIMARY KEY,
    functionid INTEGER NOT NULL REFERENCES function(id) ON DELETE CASCADE,
    address1 INTEGER NOT NULL,
    address2 INTEGER NOT NULL,
    algorithm TEXT NOT NULL,
    manual_flag INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS instruction (
    basicblockid INTEGER NOT NULL REFERENCES basicblock(id) ON DELETE CASCADE,
    address1 INTEGER NOT NULL,
    address2 INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS comment (
    address1 INTEGER,
    address2 INTEGER,
    placement TEXT NOT NULL,
    text TEXT NOT NULL,
    UNIQUE (address1, address2, placement)
);
";

/// Opens (or creates) a match database at the given path.
///
/// # Errors
///
/// Returns [`Error::StorageError`](crate::Error::StorageError) if the file
/// cannot be opened or the schema cannot be created.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Opens an in-memory match database, mainly for tests.
///
/// # Errors
///
/// Returns [`Error::StorageError`](crate::Error::StorageError) if the schema
/// cannot be created.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Saves the match model and comments, replacing any previous content.
///
/// Runs in one transaction: on any error the database keeps its previous
/// content and the in-memory model is untouched (it is only read here).
///
/// # Errors
///
/// Returns [`Error::StorageError`](crate::Error::StorageError) on any SQLite
/// failure.
pub fn save(conn: &mut Connection, matches: &MatchData, comments: &CommentStore) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM instruction", [])?;
    tx.execute("DELETE FROM basicblock", [])?;
    tx.execute("DELETE FROM function", [])?;
    tx.execute("DELETE FROM comment", [])?;

    {
        let mut insert_function = tx.prepare(
            "INSERT INTO function (address1, address2, similarity, confidence, flags, algorithm, \
             basicblocks, edges, instructions) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let mut insert_block = tx.prepare(
            "INSERT INTO basicblock (functionid, address1, address2, algorithm, manual_flag) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut insert_instruction = tx.prepare(
            "INSERT INTO instruction (basicblockid, address1, address2) VALUES (?1, ?2, ?3)",
        )?;

        for function in matches.function_matches() {
            insert_function.execute(params![
                function.primary_address().value() as i64,
                function.secondary_address().value() as i64,
                function.similarity(),
                function.confidence(),
                i64::from(function.flags().bits()),
                function.algorithm().to_string(),
                function.matched_basic_blocks() as i64,
                function.matched_flow_edges() as i64,
                function.matched_instructions() as i64,
            ])?;
            let function_id = tx.last_insert_rowid();

            for block in function.basic_block_matches() {
                insert_block.execute(params![
                    function_id,
                    block.primary_address().value() as i64,
                    block.secondary_address().value() as i64,
                    block.algorithm().to_string(),
                    i64::from(block.algorithm().is_manual()),
                ])?;
                let block_id = tx.last_insert_rowid();

                for instruction in block.instruction_matches() {
                    insert_instruction.execute(params![
                        block_id,
                        instruction.primary_address().value() as i64,
                        instruction.secondary_address().value() as i64,
                    ])?;
                }
            }
        }

        let mut insert_comment = tx.prepare(
            "INSERT INTO comment (address1, address2, placement, text) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (pair, placement, text) in comments.iter() {
            insert_comment.execute(params![
                pair.primary().map(|a| a.value() as i64),
                pair.secondary().map(|a| a.value() as i64),
                placement.to_string(),
                text,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Loads the match model and comments from a database.
///
/// The returned [`MatchData`] publishes to `events`; loading emits the usual
/// per-match events, so callers that only want the final state drain the queue
/// once afterwards.
///
/// # Errors
///
/// Returns [`Error::StorageError`](crate::Error::StorageError) on SQLite
/// failures and [`Error::CorruptDatabase`](crate::Error::CorruptDatabase) if a
/// stored algorithm name does not parse, a flag word does not fit, a match
/// violates per-side uniqueness, or a persisted counter column disagrees with
/// the recomputed sum.
pub fn load(conn: &Connection, events: EventQueue) -> Result<(MatchData, CommentStore)> {
    let mut data = MatchData::new(events);

    struct FunctionRow {
        id: i64,
        function: FunctionMatch,
        basicblocks: u64,
        edges: u64,
        instructions: u64,
    }

    let mut functions = conn.prepare(
        "SELECT id, address1, address2, similarity, confidence, flags, algorithm, basicblocks, \
         edges, instructions FROM function ORDER BY address1",
    )?;
    let rows: Vec<FunctionRow> = functions
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i64>(9)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(id, a1, a2, similarity, confidence, flags, algorithm, blocks, edges, instrs)| {
            let algorithm = parse_algorithm(&algorithm)?;
            let flags = u32::try_from(flags)
                .ok()
                .and_then(FunctionMatchFlags::from_bits)
                .ok_or_else(|| CorruptDatabase(format!("Invalid function flags {flags}")))?;
            let function = FunctionMatch::new(
                Address::new(a1 as u64),
                Address::new(a2 as u64),
                similarity,
                confidence,
                algorithm,
            )
            .with_flags(flags);
            Ok(FunctionRow {
                id,
                function,
                basicblocks: blocks as u64,
                edges: edges as u64,
                instructions: instrs as u64,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut blocks = conn.prepare(
        "SELECT id, address1, address2, algorithm, manual_flag FROM basicblock \
         WHERE functionid = ?1 ORDER BY address1",
    )?;
    let mut instructions = conn.prepare(
        "SELECT address1, address2 FROM instruction WHERE basicblockid = ?1 ORDER BY address1",
    )?;

    for mut row in rows {
        let block_rows: Vec<(i64, i64, i64, String, i64)> = blocks
            .query_map([row.id], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, i64>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (block_id, a1, a2, algorithm, manual_flag) in block_rows {
            let algorithm = parse_algorithm(&algorithm)?;
            if algorithm.is_manual() != (manual_flag != 0) {
                return Err(CorruptDatabase(format!(
                    "Basic block {a1:#x}: manual flag disagrees with algorithm '{algorithm}'"
                )));
            }
            let mut block = BasicBlockMatch::new(
                Address::new(a1 as u64),
                Address::new(a2 as u64),
                algorithm,
            );

            let instruction_rows: Vec<(i64, i64)> = instructions
                .query_map([block_id], |r| {
                    Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (ia1, ia2) in instruction_rows {
                block
                    .add_instruction_match(InstructionMatch::new(
                        Address::new(ia1 as u64),
                        Address::new(ia2 as u64),
                    ))
                    .map_err(|e| CorruptDatabase(e.to_string()))?;
            }

            row.function
                .add_basic_block_match(block)
                .map_err(|e| CorruptDatabase(e.to_string()))?;
        }

        // The persisted counters are a cross-check, not the source of truth.
        if row.function.matched_basic_blocks() != row.basicblocks
            || row.function.matched_instructions() != row.instructions
        {
            return Err(CorruptDatabase(format!(
                "Function match {}: persisted counters ({} blocks, {} instructions) disagree \
                 with contents ({} blocks, {} instructions)",
                row.function.address_pair(),
                row.basicblocks,
                row.instructions,
                row.function.matched_basic_blocks(),
                row.function.matched_instructions(),
            )));
        }
        row.function.restore_flow_edges(row.edges);

        data.add_function_match(row.function, None)
            .map_err(|e| CorruptDatabase(e.to_string()))?;
    }

    let mut comments = CommentStore::new();
    let mut comment_rows = conn.prepare("SELECT address1, address2, placement, text FROM comment")?;
    let loaded: Vec<(Option<i64>, Option<i64>, String, String)> = comment_rows
        .query_map([], |r| {
            Ok((
                r.get::<_, Option<i64>>(0)?,
                r.get::<_, Option<i64>>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (a1, a2, placement, text) in loaded {
        let pair = match (a1, a2) {
            (Some(p), Some(s)) => {
                AddressPair::matched(Address::new(p as u64), Address::new(s as u64))
            }
            (Some(p), None) => AddressPair::primary_only(Address::new(p as u64)),
            (None, Some(s)) => AddressPair::secondary_only(Address::new(s as u64)),
            (None, None) => {
                return Err(CorruptDatabase(
                    "Comment with neither side addressed".to_string(),
                ))
            }
        };
        let placement = CommentPlacement::from_str(&placement)
            .map_err(|_| CorruptDatabase(format!("Unknown comment placement '{placement}'")))?;
        comments.set(pair, placement, text);
    }

    Ok((data, comments))
}

fn parse_algorithm(name: &str) -> Result<MatchAlgorithm> {
    MatchAlgorithm::from_str(name)
        .map_err(|_| CorruptDatabase(format!("Unknown match algorithm '{name}'")))
}
