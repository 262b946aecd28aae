//! Raw instruction representation.

use std::fmt;

use crate::matches::Address;

/// A single disassembled instruction as delivered by the loader.
///
/// Only the fields the diff views need are carried: the instruction address is
/// the universal join key against the match model, and the mnemonic is used for
/// display and reporting. Operand details stay with the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The address of this instruction.
    pub address: Address,
    /// The instruction mnemonic, e.g. `"mov"` or `"call"`.
    pub mnemonic: String,
}

impl Instruction {
    /// Creates a new instruction.
    #[must_use]
    pub fn new(address: Address, mnemonic: impl Into<String>) -> Self {
        Self {
            address,
            mnemonic: mnemonic.into(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.mnemonic)
    }
}
