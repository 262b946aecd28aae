//! Raw basic block representation.

use crate::{matches::Address, program::Instruction};

/// A straight-line sequence of instructions with a single entry and exit.
///
/// Basic blocks are addressed by the address of their first instruction; that
/// address is the key under which the block participates in the match model and
/// the flow-graph views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// The address of the block, which is the address of its first instruction.
    pub address: Address,
    /// The instructions of the block, in address order.
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    /// Creates a new basic block from its instructions.
    ///
    /// The block address is taken from the first instruction; an empty
    /// instruction list yields a block addressed at `address`.
    #[must_use]
    pub fn new(address: Address, instructions: Vec<Instruction>) -> Self {
        Self {
            address,
            instructions,
        }
    }

    /// Returns the number of instructions in this block.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns the instruction at the given address, if it belongs to this block.
    #[must_use]
    pub fn instruction_at(&self, address: Address) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.address == address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> BasicBlock {
        BasicBlock::new(
            Address::new(0x1000),
            vec![
                Instruction::new(Address::new(0x1000), "push"),
                Instruction::new(Address::new(0x1001), "mov"),
                Instruction::new(Address::new(0x1004), "ret"),
            ],
        )
    }

    #[test]
    fn test_instruction_count() {
        assert_eq!(block().instruction_count(), 3);
    }

    #[test]
    fn test_instruction_at() {
        let b = block();
        assert_eq!(
            b.instruction_at(Address::new(0x1001)).map(|i| i.mnemonic.as_str()),
            Some("mov")
        );
        assert!(b.instruction_at(Address::new(0x2000)).is_none());
    }
}
