//! Matching-step identification.

use strum::{Display, EnumString};

/// The matching step that produced a correspondence.
///
/// Matches arrive from the external diffing engine tagged with the algorithm
/// that claimed them; matches created interactively by the user carry
/// [`MatchAlgorithm::Manual`]. The string forms round-trip through the match
/// database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MatchAlgorithm {
    /// Matched by identical symbol name hashes.
    #[strum(serialize = "name hash")]
    NameHash,
    /// Matched by structural fingerprints of the surrounding graph.
    #[strum(serialize = "edges prime product")]
    EdgesPrimeProduct,
    /// Matched by relative position in the address sequence.
    #[strum(serialize = "address sequence")]
    AddressSequence,
    /// Matched by identical instruction counts within already-matched context.
    #[strum(serialize = "instruction count")]
    InstructionCount,
    /// Matched by agreeing call references to already-matched functions.
    #[strum(serialize = "call reference")]
    CallReference,
    /// Matched interactively by the user.
    #[strum(serialize = "manual")]
    Manual,
}

impl MatchAlgorithm {
    /// Returns `true` if this match was created interactively.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_name_roundtrip() {
        for algorithm in [
            MatchAlgorithm::NameHash,
            MatchAlgorithm::EdgesPrimeProduct,
            MatchAlgorithm::AddressSequence,
            MatchAlgorithm::InstructionCount,
            MatchAlgorithm::CallReference,
            MatchAlgorithm::Manual,
        ] {
            let name = algorithm.to_string();
            assert_eq!(MatchAlgorithm::from_str(&name).unwrap(), algorithm);
        }
    }

    #[test]
    fn test_is_manual() {
        assert!(MatchAlgorithm::Manual.is_manual());
        assert!(!MatchAlgorithm::NameHash.is_manual());
    }
}
