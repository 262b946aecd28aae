//! Basic-block-level match records.

use crate::{
    matches::{
        bipartite::{BipartiteMatchMap, Correspondence},
        Address, InstructionMatch, MatchAlgorithm,
    },
    Result,
};

/// A correspondence between one primary-side and one secondary-side basic block.
///
/// Owns the instruction matches inside the block pair as a bipartite map: each
/// side's instruction address participates in at most one instruction match.
#[derive(Debug, Clone)]
pub struct BasicBlockMatch {
    primary: Address,
    secondary: Address,
    /// The matching step that claimed this block pair.
    algorithm: MatchAlgorithm,
    /// Instruction matches inside this block pair, unique per side.
    instructions: BipartiteMatchMap<InstructionMatch>,
}

impl BasicBlockMatch {
    /// Creates a new basic-block match with no instruction matches.
    #[must_use]
    pub fn new(primary: Address, secondary: Address, algorithm: MatchAlgorithm) -> Self {
        Self {
            primary,
            secondary,
            algorithm,
            instructions: BipartiteMatchMap::new(),
        }
    }

    /// Returns the matching step that claimed this block pair.
    #[must_use]
    pub const fn algorithm(&self) -> MatchAlgorithm {
        self.algorithm
    }

    /// Adds an instruction match inside this block pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMatch`](crate::Error::DuplicateMatch) if either
    /// instruction address already participates in a match.
    pub fn add_instruction_match(&mut self, instruction: InstructionMatch) -> Result<()> {
        self.instructions.insert(instruction)
    }

    /// Returns the instruction match containing the given primary-side address.
    #[must_use]
    pub fn instruction_by_primary(&self, primary: Address) -> Option<&InstructionMatch> {
        self.instructions.get_by_primary(primary)
    }

    /// Returns the instruction match containing the given secondary-side address.
    #[must_use]
    pub fn instruction_by_secondary(&self, secondary: Address) -> Option<&InstructionMatch> {
        self.instructions.get_by_secondary(secondary)
    }

    /// Returns an iterator over all instruction matches in this block pair.
    pub fn instruction_matches(&self) -> impl Iterator<Item = &InstructionMatch> {
        self.instructions.iter()
    }

    /// Returns the number of matched instructions in this block pair.
    #[must_use]
    pub fn matched_instructions(&self) -> u64 {
        self.instructions.len() as u64
    }

    /// Returns the number of changed instructions given the block sizes on both
    /// sides.
    ///
    /// This is a counting approximation: the larger side's instruction count
    /// minus the matched count, clamped at zero. Block-boundary consistency of
    /// edited instruction matches is not re-verified here.
    #[must_use]
    pub fn changed_instructions(&self, primary_len: u64, secondary_len: u64) -> u64 {
        primary_len
            .max(secondary_len)
            .saturating_sub(self.matched_instructions())
    }
}

impl Correspondence for BasicBlockMatch {
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

    fn block_match() -> BasicBlockMatch {
        let mut m = BasicBlockMatch::new(
            Address::new(0x1010),
            Address::new(0x2010),
            MatchAlgorithm::EdgesPrimeProduct,
        );
        m.add_instruction_match(InstructionMatch::new(Address::new(0x1010), Address::new(0x2010)))
            .unwrap();
        m.add_instruction_match(InstructionMatch::new(Address::new(0x1011), Address::new(0x2012)))
            .unwrap();
        m
    }

    #[test]
    fn test_instruction_uniqueness_per_side() {
        let mut m = block_match();
        assert!(m
            .add_instruction_match(InstructionMatch::new(
                Address::new(0x1010),
                Address::new(0x2020)
            ))
            .is_err());
        assert!(m
            .add_instruction_match(InstructionMatch::new(
                Address::new(0x1020),
                Address::new(0x2012)
            ))
            .is_err());
        assert_eq!(m.matched_instructions(), 2);
    }

    #[test]
    fn test_lookup_both_sides() {
        let m = block_match();
        assert!(m.instruction_by_primary(Address::new(0x1011)).is_some());
        assert!(m.instruction_by_secondary(Address::new(0x2012)).is_some());
        assert!(m.instruction_by_primary(Address::new(0x9999)).is_none());
    }

    #[test]
    fn test_changed_instructions_approximation() {
        let m = block_match();
        assert_eq!(m.changed_instructions(5, 3), 3);
        assert_eq!(m.changed_instructions(2, 2), 0);
        // Matched count exceeding both sides clamps at zero.
        assert_eq!(m.changed_instructions(1, 1), 0);
    }
}
