//! Function-level match records.

use bitflags::bitflags;

use crate::{
    matches::{
        bipartite::{BipartiteMatchMap, Correspondence},
        Address, BasicBlockMatch, MatchAlgorithm,
    },
    Result,
};

bitflags! {
    /// Property flags of a function match, carried through persistence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FunctionMatchFlags: u32 {
        /// Both functions were recognized as statically linked library code.
        const LIBRARY = 1 << 0;
        /// Both functions are thunks forwarding to another function.
        const THUNK = 1 << 1;
    }
}

/// A correspondence between one primary-side and one secondary-side function.
///
/// Owns the basic-block matches of the function pair and maintains running
/// counters (matched basic blocks, flow edges, instructions) that must equal
/// the sums over the contained basic-block matches at all times. The counters
/// exist so UI panels can read totals without re-scanning; they are verified
/// defensively, not assumed (see [`verify_counters`](Self::verify_counters)).
#[derive(Debug, Clone)]
pub struct FunctionMatch {
    primary: Address,
    secondary: Address,
    similarity: f64,
    confidence: f64,
    flags: FunctionMatchFlags,
    algorithm: MatchAlgorithm,
    /// Basic-block matches of this function pair, unique per side.
    basic_blocks: BipartiteMatchMap<BasicBlockMatch>,
    matched_basic_blocks: u64,
    matched_flow_edges: u64,
    matched_instructions: u64,
}

impl FunctionMatch {
    /// Creates a new function match with no basic-block matches.
    #[must_use]
    pub fn new(
        primary: Address,
        secondary: Address,
        similarity: f64,
        confidence: f64,
        algorithm: MatchAlgorithm,
    ) -> Self {
        Self {
            primary,
            secondary,
            similarity,
            confidence,
            flags: FunctionMatchFlags::empty(),
            algorithm,
            basic_blocks: BipartiteMatchMap::new(),
            matched_basic_blocks: 0,
            matched_flow_edges: 0,
            matched_instructions: 0,
        }
    }

    /// Sets the property flags, builder style.
    #[must_use]
    pub fn with_flags(mut self, flags: FunctionMatchFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the similarity score in `[0, 1]`.
    #[must_use]
    pub const fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Returns the confidence score in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the property flags.
    #[must_use]
    pub const fn flags(&self) -> FunctionMatchFlags {
        self.flags
    }

    /// Returns the matching step that claimed this function pair.
    #[must_use]
    pub const fn algorithm(&self) -> MatchAlgorithm {
        self.algorithm
    }

    /// Returns `true` if the matched functions differ, i.e. similarity is below 1.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.similarity < 1.0
    }

    /// Returns `Ok` if `block` could be added without violating per-side
    /// uniqueness of basic-block matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either
    /// block address already participates in a match.
    pub fn can_add_basic_block_match(&self, block: &BasicBlockMatch) -> Result<()> {
        if self.basic_blocks.conflicts(block) {
            return Err(crate::Error::DuplicateMatch(block.address_pair()));
        }
        Ok(())
    }

    /// Adds a basic-block match and updates the running counters.
    ///
    /// The matched flow-edge counter is not touched here; edge deltas depend on
    /// the combined view and are applied by the owning
    /// [`MatchData`](crate::matches::MatchData) in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either
    /// block address already participates in a match; counters are unchanged.
    pub fn add_basic_block_match(&mut self, block: BasicBlockMatch) -> Result<()> {
        let instructions = block.matched_instructions();
        self.basic_blocks.insert(block)?;
        self.matched_basic_blocks += 1;
        self.matched_instructions += instructions;
        Ok(())
    }

    /// Removes the basic-block match with the given primary-side address and
    /// restores the running counters.
    ///
    /// Returns `None` without touching any state if no such match exists.
    pub fn remove_basic_block_match(&mut self, primary: Address) -> Option<BasicBlockMatch> {
        let block = self.basic_blocks.remove_by_primary(primary)?;
        self.matched_basic_blocks -= 1;
        self.matched_instructions -= block.matched_instructions();
        Some(block)
    }

    /// Returns the basic-block match containing the given primary-side address.
    #[must_use]
    pub fn basic_block_by_primary(&self, primary: Address) -> Option<&BasicBlockMatch> {
        self.basic_blocks.get_by_primary(primary)
    }

    /// Returns the basic-block match containing the given secondary-side address.
    #[must_use]
    pub fn basic_block_by_secondary(&self, secondary: Address) -> Option<&BasicBlockMatch> {
        self.basic_blocks.get_by_secondary(secondary)
    }

    /// Returns an iterator over all basic-block matches of this function pair.
    pub fn basic_block_matches(&self) -> impl Iterator<Item = &BasicBlockMatch> {
        self.basic_blocks.iter()
    }

    /// Returns the number of matched basic blocks.
    #[must_use]
    pub const fn matched_basic_blocks(&self) -> u64 {
        self.matched_basic_blocks
    }

    /// Returns the number of matched flow edges.
    #[must_use]
    pub const fn matched_flow_edges(&self) -> u64 {
        self.matched_flow_edges
    }

    /// Returns the number of matched instructions across all basic-block matches.
    #[must_use]
    pub const fn matched_instructions(&self) -> u64 {
        self.matched_instructions
    }

    /// Adds to the matched flow-edge counter.
    pub(crate) fn add_flow_edges(&mut self, delta: u64) {
        self.matched_flow_edges += delta;
    }

    /// Subtracts from the matched flow-edge counter.
    pub(crate) fn remove_flow_edges(&mut self, delta: u64) {
        self.matched_flow_edges = self.matched_flow_edges.saturating_sub(delta);
    }

    /// Restores the matched flow-edge counter from a persisted value.
    pub(crate) fn restore_flow_edges(&mut self, count: u64) {
        self.matched_flow_edges = count;
    }

    /// Verifies that the running counters equal the sums over the contained
    /// basic-block matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentState`](crate::Error::InconsistentState)
    /// naming the drifted counter.
    pub fn verify_counters(&self) -> Result<()> {
        let blocks = self.basic_blocks.len() as u64;
        if blocks != self.matched_basic_blocks {
            return Err(inconsistent_error!(
                "Function match {}: basic block counter {} != actual {}",
                self.address_pair(),
                self.matched_basic_blocks,
                blocks
            ));
        }

        let instructions: u64 = self.basic_blocks.iter().map(BasicBlockMatch::matched_instructions).sum();
        if instructions != self.matched_instructions {
            return Err(inconsistent_error!(
                "Function match {}: instruction counter {} != actual {}",
                self.address_pair(),
                self.matched_instructions,
                instructions
            ));
        }
        Ok(())
    }
}

impl Correspondence for FunctionMatch {
    fn primary_address(&self) -> Address {
        self.primary
    }

    fn secondary_address(&self) -> Address {
        self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::InstructionMatch;

    fn function_match() -> FunctionMatch {
        FunctionMatch::new(
            Address::new(0x1000),
            Address::new(0x2000),
            0.75,
            0.9,
            MatchAlgorithm::NameHash,
        )
    }

    fn block_match(p: u64, s: u64, instructions: u64) -> BasicBlockMatch {
        let mut block = BasicBlockMatch::new(
            Address::new(p),
            Address::new(s),
            MatchAlgorithm::EdgesPrimeProduct,
        );
        for i in 0..instructions {
            block
                .add_instruction_match(InstructionMatch::new(
                    Address::new(p + i),
                    Address::new(s + i),
                ))
                .unwrap();
        }
        block
    }

    #[test]
    fn test_counters_track_basic_blocks() {
        let mut m = function_match();
        m.add_basic_block_match(block_match(0x1010, 0x2010, 3)).unwrap();
        m.add_basic_block_match(block_match(0x1020, 0x2020, 2)).unwrap();

        assert_eq!(m.matched_basic_blocks(), 2);
        assert_eq!(m.matched_instructions(), 5);
        m.verify_counters().unwrap();

        let removed = m.remove_basic_block_match(Address::new(0x1010)).unwrap();
        assert_eq!(removed.matched_instructions(), 3);
        assert_eq!(m.matched_basic_blocks(), 1);
        assert_eq!(m.matched_instructions(), 2);
        m.verify_counters().unwrap();
    }

    #[test]
    fn test_duplicate_block_leaves_counters() {
        let mut m = function_match();
        m.add_basic_block_match(block_match(0x1010, 0x2010, 3)).unwrap();
        assert!(m.add_basic_block_match(block_match(0x1010, 0x2030, 1)).is_err());
        assert_eq!(m.matched_basic_blocks(), 1);
        assert_eq!(m.matched_instructions(), 3);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut m = function_match();
        m.add_basic_block_match(block_match(0x1010, 0x2010, 3)).unwrap();
        assert!(m.remove_basic_block_match(Address::new(0x9999)).is_none());
        assert_eq!(m.matched_basic_blocks(), 1);
        assert_eq!(m.matched_instructions(), 3);
    }

    #[test]
    fn test_is_changed() {
        assert!(function_match().is_changed());
        let identical = FunctionMatch::new(
            Address::new(1),
            Address::new(2),
            1.0,
            1.0,
            MatchAlgorithm::NameHash,
        );
        assert!(!identical.is_changed());
    }
}
