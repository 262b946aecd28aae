//! User comments attached to diff positions.
//!
//! Comments are keyed by `(address pair, placement)` and live outside the match
//! model proper: adding or removing a match never touches comments, and a
//! comment may outlive the match it was written against.

use std::collections::HashMap;

use strum::{Display, EnumString};

use crate::matches::AddressPair;

/// Which rendering of a position a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum CommentPlacement {
    /// Attached to the primary-side view of the position.
    #[strum(serialize = "primary")]
    Primary,
    /// Attached to the secondary-side view of the position.
    #[strum(serialize = "secondary")]
    Secondary,
    /// Attached to the combined view of the position.
    #[strum(serialize = "combined")]
    Combined,
}

/// The in-memory key-value store of user comments for one diff.
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    comments: HashMap<(AddressPair, CommentPlacement), String>,
}

impl CommentStore {
    /// Creates an empty comment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comment for a position, replacing any previous text. An empty
    /// string removes the comment.
    pub fn set(&mut self, pair: AddressPair, placement: CommentPlacement, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.comments.remove(&(pair, placement));
        } else {
            self.comments.insert((pair, placement), text);
        }
    }

    /// Returns the comment for a position, if any.
    #[must_use]
    pub fn get(&self, pair: AddressPair, placement: CommentPlacement) -> Option<&str> {
        self.comments.get(&(pair, placement)).map(String::as_str)
    }

    /// Removes and returns the comment for a position.
    pub fn remove(&mut self, pair: AddressPair, placement: CommentPlacement) -> Option<String> {
        self.comments.remove(&(pair, placement))
    }

    /// Returns an iterator over all comments as `(pair, placement, text)`.
    pub fn iter(&self) -> impl Iterator<Item = (AddressPair, CommentPlacement, &str)> {
        self.comments
            .iter()
            .map(|(&(pair, placement), text)| (pair, placement, text.as_str()))
    }

    /// Returns the number of stored comments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Returns `true` if no comments are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Address;

    #[test]
    fn test_set_get_remove() {
        let mut store = CommentStore::new();
        let pair = AddressPair::matched(Address::new(0x1000), Address::new(0x2000));

        store.set(pair, CommentPlacement::Primary, "renamed in v2");
        assert_eq!(store.get(pair, CommentPlacement::Primary), Some("renamed in v2"));
        assert_eq!(store.get(pair, CommentPlacement::Secondary), None);

        assert_eq!(
            store.remove(pair, CommentPlacement::Primary),
            Some("renamed in v2".to_string())
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_text_removes() {
        let mut store = CommentStore::new();
        let pair = AddressPair::primary_only(Address::new(0x1000));
        store.set(pair, CommentPlacement::Combined, "note");
        store.set(pair, CommentPlacement::Combined, "");
        assert!(store.is_empty());
    }
}
