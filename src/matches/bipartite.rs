//! Bipartite match map: the uniqueness-enforcing container behind every
//! match granularity.
//!
//! Function matches within a diff, basic-block matches within a function and
//! instruction matches within a basic block all share the same shape: a set of
//! correspondence records in which every primary address and every secondary
//! address appears at most once, with O(1) lookup from either side.

use std::collections::HashMap;

use crate::{
    matches::{Address, AddressPair},
    Error::DuplicateMatch,
    Result,
};

/// A record that corresponds one primary-side entity to one secondary-side
/// entity.
///
/// Implemented by the three match granularities so [`BipartiteMatchMap`] can
/// index them from either side.
pub trait Correspondence {
    /// The primary-side address of this record.
    fn primary_address(&self) -> Address;

    /// The secondary-side address of this record.
    fn secondary_address(&self) -> Address;

    /// The address pair of this record.
    fn address_pair(&self) -> AddressPair {
        AddressPair::matched(self.primary_address(), self.secondary_address())
    }
}

/// A collection of correspondence records, unique per side, with bidirectional
/// O(1) lookup.
///
/// Records are stored contiguously; two side indices map each side's address to
/// the record position. Removal uses swap-remove and repairs the indices of the
/// displaced record, so all operations stay O(1).
#[derive(Debug, Clone, Default)]
pub(crate) struct BipartiteMatchMap<T: Correspondence> {
    items: Vec<T>,
    by_primary: HashMap<Address, usize>,
    by_secondary: HashMap<Address, usize>,
}

impl<T: Correspondence> BipartiteMatchMap<T> {
    /// Creates an empty map.
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            by_primary: HashMap::new(),
            by_secondary: HashMap::new(),
        }
    }

    /// Returns `true` if inserting `item` would violate per-side uniqueness.
    pub(crate) fn conflicts(&self, item: &T) -> bool {
        self.by_primary.contains_key(&item.primary_address())
            || self.by_secondary.contains_key(&item.secondary_address())
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateMatch`] if either side's address already participates
    /// in a record; the map is left unchanged.
    pub(crate) fn insert(&mut self, item: T) -> Result<()> {
        if self.conflicts(&item) {
            return Err(DuplicateMatch(item.address_pair()));
        }

        let index = self.items.len();
        self.by_primary.insert(item.primary_address(), index);
        self.by_secondary.insert(item.secondary_address(), index);
        self.items.push(item);
        Ok(())
    }

    /// Removes and returns the record with the given primary address, or `None`
    /// if no such record exists.
    pub(crate) fn remove_by_primary(&mut self, primary: Address) -> Option<T> {
        let index = self.by_primary.remove(&primary)?;
        let item = self.items.swap_remove(index);
        self.by_secondary.remove(&item.secondary_address());

        // Repair the indices of the record that was swapped into `index`.
        if index < self.items.len() {
            let moved = &self.items[index];
            self.by_primary.insert(moved.primary_address(), index);
            self.by_secondary.insert(moved.secondary_address(), index);
        }
        Some(item)
    }

    /// Returns the record with the given primary address.
    pub(crate) fn get_by_primary(&self, primary: Address) -> Option<&T> {
        self.by_primary.get(&primary).map(|&i| &self.items[i])
    }

    /// Returns a mutable reference to the record with the given primary address.
    ///
    /// Callers must not change the record's addresses through this reference;
    /// the side indices are keyed by them.
    pub(crate) fn get_by_primary_mut(&mut self, primary: Address) -> Option<&mut T> {
        self.by_primary.get(&primary).map(|&i| &mut self.items[i])
    }

    /// Returns the record with the given secondary address.
    pub(crate) fn get_by_secondary(&self, secondary: Address) -> Option<&T> {
        self.by_secondary.get(&secondary).map(|&i| &self.items[i])
    }

    /// Returns an iterator over all records, in unspecified order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Returns the number of records.
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the map holds no records.
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair(Address, Address);

    impl Correspondence for Pair {
        fn primary_address(&self) -> Address {
            self.0
        }
        fn secondary_address(&self) -> Address {
            self.1
        }
    }

    fn pair(p: u64, s: u64) -> Pair {
        Pair(Address::new(p), Address::new(s))
    }

    #[test]
    fn test_insert_and_lookup_both_sides() {
        let mut map = BipartiteMatchMap::new();
        map.insert(pair(1, 10)).unwrap();
        map.insert(pair(2, 20)).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get_by_primary(Address::new(1)), Some(&pair(1, 10)));
        assert_eq!(map.get_by_secondary(Address::new(20)), Some(&pair(2, 20)));
        assert_eq!(map.get_by_primary(Address::new(3)), None);
    }

    #[test]
    fn test_duplicate_primary_rejected() {
        let mut map = BipartiteMatchMap::new();
        map.insert(pair(1, 10)).unwrap();
        assert!(map.insert(pair(1, 20)).is_err());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_duplicate_secondary_rejected() {
        let mut map = BipartiteMatchMap::new();
        map.insert(pair(1, 10)).unwrap();
        assert!(map.insert(pair(2, 10)).is_err());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_repairs_swapped_indices() {
        let mut map = BipartiteMatchMap::new();
        map.insert(pair(1, 10)).unwrap();
        map.insert(pair(2, 20)).unwrap();
        map.insert(pair(3, 30)).unwrap();

        // Removing the first record swap-moves the last into its slot.
        assert_eq!(map.remove_by_primary(Address::new(1)), Some(pair(1, 10)));
        assert_eq!(map.get_by_primary(Address::new(3)), Some(&pair(3, 30)));
        assert_eq!(map.get_by_secondary(Address::new(30)), Some(&pair(3, 30)));
        assert_eq!(map.get_by_primary(Address::new(1)), None);
        assert_eq!(map.get_by_secondary(Address::new(10)), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut map: BipartiteMatchMap<Pair> = BipartiteMatchMap::new();
        assert_eq!(map.remove_by_primary(Address::new(1)), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_reinsert_after_remove() {
        let mut map = BipartiteMatchMap::new();
        map.insert(pair(1, 10)).unwrap();
        map.remove_by_primary(Address::new(1)).unwrap();
        map.insert(pair(1, 10)).unwrap();
        assert_eq!(map.len(), 1);
    }
}
