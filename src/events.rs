//! Change notification for match and view mutations.
//!
//! Observers (UI panels, reporting) never re-scan the match model; they react to
//! [`DiffEvent`]s. Events are delivered through an explicit queue the UI layer
//! drains each frame rather than through listener lists, which decouples core
//! mutation from notification ordering: a mutation publishes its events and
//! returns, and no observer code runs inside the mutation.
//!
//! Every mutation entry point publishes its structural event plus at most one
//! [`DiffEvent::CountsChanged`], carrying the new totals.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{
    matches::{AddressPair, DiffCounts},
    views::ViewRole,
};

/// A change to the match model or the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEvent {
    /// A function match was added.
    FunctionMatchAdded {
        /// The address pair of the new function match.
        pair: AddressPair,
    },
    /// A function match was removed, cascading to its basic-block and
    /// instruction matches.
    FunctionMatchRemoved {
        /// The address pair of the removed function match.
        pair: AddressPair,
    },
    /// A basic-block match was added to a function match.
    BasicBlockMatchAdded {
        /// The address pair of the containing function match.
        function: AddressPair,
        /// The address pair of the new basic-block match.
        pair: AddressPair,
    },
    /// A basic-block match was removed from a function match.
    BasicBlockMatchRemoved {
        /// The address pair of the containing function match.
        function: AddressPair,
        /// The address pair of the removed basic-block match.
        pair: AddressPair,
    },
    /// The running totals changed; carries the new values.
    CountsChanged(DiffCounts),
    /// The selection of a view changed (including through undo/redo).
    SelectionChanged {
        /// The view whose selection was the origin of the change.
        view: ViewRole,
    },
    /// Node visibility in a view changed (proximity fold/expand).
    VisibilityChanged {
        /// The view whose visibility changed.
        view: ViewRole,
    },
}

/// Components that respond to diff events.
pub trait DiffEventListener {
    /// Handles one event.
    fn handle_event(&mut self, event: &DiffEvent);
}

/// The event queue of one diff session.
///
/// Cheap to clone; all clones share the same underlying channel. The match
/// model and every view container of a session hold clones of one queue, so
/// the UI observes a single ordered stream.
///
/// # Examples
///
/// ```rust
/// use diffscope::events::{DiffEvent, EventQueue};
///
/// let queue = EventQueue::new();
/// queue.publish(DiffEvent::CountsChanged(Default::default()));
/// assert_eq!(queue.drain().len(), 1);
/// assert!(queue.drain().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<DiffEvent>,
    rx: Receiver<DiffEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Creates a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Publishes an event.
    pub fn publish(&self, event: DiffEvent) {
        // Send can only fail if all receivers are gone, which cannot happen
        // while this clone holds one.
        let _ = self.tx.send(event);
    }

    /// Removes and returns all pending events, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<DiffEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Dispatches all pending events to a listener, oldest first.
    pub fn dispatch_to<L: DiffEventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Address;

    #[test]
    fn test_publish_and_drain_in_order() {
        let queue = EventQueue::new();
        let pair = AddressPair::matched(Address::new(1), Address::new(2));

        queue.publish(DiffEvent::FunctionMatchAdded { pair });
        queue.publish(DiffEvent::CountsChanged(DiffCounts::default()));

        let events = queue.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], DiffEvent::FunctionMatchAdded { pair });
        assert!(matches!(events[1], DiffEvent::CountsChanged(_)));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_clones_share_channel() {
        let queue = EventQueue::new();
        let clone = queue.clone();
        clone.publish(DiffEvent::SelectionChanged {
            view: ViewRole::Combined,
        });
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn test_dispatch_to_listener() {
        struct Counter(usize);
        impl DiffEventListener for Counter {
            fn handle_event(&mut self, _event: &DiffEvent) {
                self.0 += 1;
            }
        }

        let queue = EventQueue::new();
        queue.publish(DiffEvent::VisibilityChanged {
            view: ViewRole::Primary,
        });
        queue.publish(DiffEvent::VisibilityChanged {
            view: ViewRole::Secondary,
        });

        let mut counter = Counter(0);
        queue.dispatch_to(&mut counter);
        assert_eq!(counter.0, 2);
    }
}
