//! Bounded undo/redo history over node-selection snapshots.
//!
//! Every view keeps its own history. Selection *broadcast* across views is a
//! container concern (see
//! [`GraphsContainer::select_nodes`](crate::views::GraphsContainer::select_nodes));
//! the history only records what was selected in its own view.

use std::collections::VecDeque;

use crate::graph::NodeId;

/// An immutable snapshot of one view's selected node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    selected: Vec<NodeId>,
}

impl SelectionSnapshot {
    /// Creates a snapshot from the given nodes; order and duplicates are
    /// normalized away.
    #[must_use]
    pub fn new(mut selected: Vec<NodeId>) -> Self {
        selected.sort_unstable();
        selected.dedup();
        Self { selected }
    }

    /// Returns the selected nodes, ascending.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.selected
    }

    /// Returns `true` if the snapshot contains the given node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.selected.binary_search(&node).is_ok()
    }
}

/// A bounded undo/redo stack of selection snapshots.
///
/// [`record`](Self::record) pushes the pre-mutation state and truncates any
/// redo history; [`undo`](Self::undo) and [`redo`](Self::redo) exchange the
/// current state for a stored one without recording a new entry. When the
/// undo stack is full the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct SelectionHistory {
    undo: VecDeque<SelectionSnapshot>,
    redo: Vec<SelectionSnapshot>,
    capacity: usize,
}

impl SelectionHistory {
    /// Creates an empty history holding at most `capacity` undo entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Records the pre-mutation selection state and truncates redo history.
    pub fn record(&mut self, before: SelectionSnapshot) {
        self.redo.clear();
        self.undo.push_back(before);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Exchanges the current state for the most recent undo entry.
    ///
    /// Returns the snapshot to restore, or `None` if there is nothing to undo.
    /// Does not record a new undo entry.
    pub fn undo(&mut self, current: SelectionSnapshot) -> Option<SelectionSnapshot> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(current);
        Some(snapshot)
    }

    /// Exchanges the current state for the most recent redo entry.
    ///
    /// Returns the snapshot to restore, or `None` if there is nothing to redo.
    /// Does not record a new undo entry through [`record`](Self::record); the
    /// undone state goes straight back onto the undo stack.
    pub fn redo(&mut self, current: SelectionSnapshot) -> Option<SelectionSnapshot> {
        let snapshot = self.redo.pop()?;
        self.undo.push_back(current);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        Some(snapshot)
    }

    /// Returns `true` if an undo entry exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns `true` if a redo entry exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Returns the maximum number of undo entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(nodes: &[usize]) -> SelectionSnapshot {
        SelectionSnapshot::new(nodes.iter().map(|&n| NodeId::new(n)).collect())
    }

    #[test]
    fn test_snapshot_normalizes() {
        let snapshot = snap(&[3, 1, 3, 2]);
        assert_eq!(
            snapshot.nodes(),
            &[NodeId::new(1), NodeId::new(2), NodeId::new(3)]
        );
        assert!(snapshot.contains(NodeId::new(2)));
        assert!(!snapshot.contains(NodeId::new(4)));
    }

    #[test]
    fn test_undo_redo_exchange() {
        let mut history = SelectionHistory::new(30);
        history.record(snap(&[])); // state before selecting {1}
        history.record(snap(&[1])); // state before selecting {1, 2}

        // Current selection is {1, 2}; undo restores {1}.
        let restored = history.undo(snap(&[1, 2])).unwrap();
        assert_eq!(restored, snap(&[1]));
        assert!(history.can_redo());

        // Redo restores {1, 2}.
        let restored = history.redo(snap(&[1])).unwrap();
        assert_eq!(restored, snap(&[1, 2]));
        assert!(history.can_undo());
    }

    #[test]
    fn test_record_truncates_redo() {
        let mut history = SelectionHistory::new(30);
        history.record(snap(&[]));
        let _ = history.undo(snap(&[1]));
        assert!(history.can_redo());

        history.record(snap(&[]));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = SelectionHistory::new(2);
        history.record(snap(&[1]));
        history.record(snap(&[2]));
        history.record(snap(&[3]));

        assert_eq!(history.undo(snap(&[4])), Some(snap(&[3])));
        assert_eq!(history.undo(snap(&[3])), Some(snap(&[2])));
        // The oldest entry {1} was dropped.
        assert_eq!(history.undo(snap(&[2])), None);
    }

    #[test]
    fn test_undo_empty_is_none() {
        let mut history = SelectionHistory::new(30);
        assert_eq!(history.undo(snap(&[1])), None);
        assert_eq!(history.redo(snap(&[1])), None);
    }
}
