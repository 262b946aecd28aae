//! Instruction-level match records.

use crate::matches::{bipartite::Correspondence, Address};

/// A correspondence between one primary-side and one secondary-side instruction.
///
/// The leaf granularity of the match model: an instruction match carries no
/// payload beyond its address pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionMatch {
    primary: Address,
    secondary: Address,
}

impl InstructionMatch {
    /// Creates a new instruction match.
    #[must_use]
    pub const fn new(primary: Address, secondary: Address) -> Self {
        Self { primary, secondary }
    }
}

impl Correspondence for InstructionMatch {
    fn primary_address(&self) -> Address {
        self.primary
    }

    fn secondary_address(&self) -> Address {
        self.secondary
    }
}
