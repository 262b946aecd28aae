//! Address primitives: the universal correspondence keys.
//!
//! Every entity in a diff session (function, basic block, instruction) is
//! identified by its [`Address`] within one side, and every correspondence
//! between the two sides is keyed by an [`AddressPair`].

use std::fmt;

/// An instruction address within one program.
///
/// `Address` wraps a `u64` virtual address. It is the join key between the raw
/// program model, the match model and the diff views, and is displayed in hex.
///
/// # Examples
///
/// ```rust
/// use diffscope::matches::Address;
///
/// let address = Address::new(0x401000);
/// assert_eq!(address.value(), 0x401000);
/// assert_eq!(address.to_string(), "0x401000");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address {
    /// Creates a new address from a raw virtual address.
    #[must_use]
    #[inline]
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Returns the raw virtual address.
    #[must_use]
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Address {
    #[inline]
    fn from(value: u64) -> Self {
        Address(value)
    }
}

impl From<Address> for u64 {
    #[inline]
    fn from(address: Address) -> Self {
        address.0
    }
}

/// A correspondence key across the two sides of a diff.
///
/// At least one side is always present; both present means the position is
/// matched. `AddressPair` is used at every granularity: function matches, basic
/// block matches, instruction matches, and the one-or-two-sided positions of the
/// combined and super views.
///
/// The invariant "at least one side present" is enforced by construction; there
/// is no way to build a pair with both sides absent.
///
/// # Examples
///
/// ```rust
/// use diffscope::matches::{Address, AddressPair};
///
/// let matched = AddressPair::matched(Address::new(0x1000), Address::new(0x2000));
/// assert!(matched.is_matched());
///
/// let one_sided = AddressPair::primary_only(Address::new(0x1000));
/// assert_eq!(one_sided.secondary(), None);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AddressPair {
    primary: Option<Address>,
    secondary: Option<Address>,
}

impl AddressPair {
    /// Creates a pair with both sides present.
    #[must_use]
    pub const fn matched(primary: Address, secondary: Address) -> Self {
        Self {
            primary: Some(primary),
            secondary: Some(secondary),
        }
    }

    /// Creates a pair with only the primary side present.
    #[must_use]
    pub const fn primary_only(primary: Address) -> Self {
        Self {
            primary: Some(primary),
            secondary: None,
        }
    }

    /// Creates a pair with only the secondary side present.
    #[must_use]
    pub const fn secondary_only(secondary: Address) -> Self {
        Self {
            primary: None,
            secondary: Some(secondary),
        }
    }

    /// Returns the primary-side address, if present.
    #[must_use]
    pub const fn primary(&self) -> Option<Address> {
        self.primary
    }

    /// Returns the secondary-side address, if present.
    #[must_use]
    pub const fn secondary(&self) -> Option<Address> {
        self.secondary
    }

    /// Returns `true` if both sides are present.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }
}

impl fmt::Display for AddressPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primary {
            Some(address) => write!(f, "{address}")?,
            None => write!(f, "-")?,
        }
        write!(f, " <-> ")?;
        match self.secondary {
            Some(address) => write!(f, "{address}"),
            None => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_address_roundtrip() {
        let address = Address::new(0xdead_beef);
        assert_eq!(address.value(), 0xdead_beef);
        let from: Address = 42u64.into();
        let back: u64 = from.into();
        assert_eq!(back, 42);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new(0x1000).to_string(), "0x1000");
        assert_eq!(format!("{:?}", Address::new(0x10)), "Address(0x10)");
    }

    #[test]
    fn test_pair_sides() {
        let pair = AddressPair::matched(Address::new(1), Address::new(2));
        assert_eq!(pair.primary(), Some(Address::new(1)));
        assert_eq!(pair.secondary(), Some(Address::new(2)));
        assert!(pair.is_matched());

        let primary = AddressPair::primary_only(Address::new(1));
        assert!(!primary.is_matched());
        assert_eq!(primary.secondary(), None);

        let secondary = AddressPair::secondary_only(Address::new(2));
        assert!(!secondary.is_matched());
        assert_eq!(secondary.primary(), None);
    }

    #[test]
    fn test_pair_display() {
        let pair = AddressPair::matched(Address::new(0x1000), Address::new(0x2000));
        assert_eq!(pair.to_string(), "0x1000 <-> 0x2000");
        assert_eq!(
            AddressPair::primary_only(Address::new(0x1000)).to_string(),
            "0x1000 <-> -"
        );
        assert_eq!(
            AddressPair::secondary_only(Address::new(0x2000)).to_string(),
            "- <-> 0x2000"
        );
    }

    #[test]
    fn test_pair_as_key() {
        let mut set = HashSet::new();
        set.insert(AddressPair::matched(Address::new(1), Address::new(2)));
        set.insert(AddressPair::matched(Address::new(1), Address::new(2)));
        set.insert(AddressPair::primary_only(Address::new(1)));
        assert_eq!(set.len(), 2);
    }
}
