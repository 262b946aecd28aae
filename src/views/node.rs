//! Node wrappers of the three view tiers.
//!
//! Each tier has its own node type, owned exclusively by that tier's arena:
//!
//! - [`SingleDiffNode`] wraps one raw node of one side;
//! - [`CombinedDiffNode`] represents one overlay position, matched or one-sided;
//! - [`SuperDiffNode`] is the layout-skeleton position behind a combined node.
//!
//! Matched-or-one-sided is a [`MatchState`]: a tagged union with no
//! both-sides-absent representation, matched exhaustively wherever the sides
//! matter. Proximity proxies are a [`ProxyNode`] variant of the node content,
//! not a separate node class.

use crate::{
    graph::NodeId,
    matches::{Address, AddressPair},
    views::Side,
};

/// Which one-sided position links a combined or super node holds.
///
/// The two `NodeId`s point into the primary and secondary single-view arenas
/// respectively. Both present means the position is matched; one present means
/// the position exists on that side only. Both absent is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// Both sides present; the position is matched.
    Matched {
        /// The primary single view's node.
        primary: NodeId,
        /// The secondary single view's node.
        secondary: NodeId,
    },
    /// Only the primary side exists.
    PrimaryOnly(NodeId),
    /// Only the secondary side exists.
    SecondaryOnly(NodeId),
}

impl MatchState {
    /// Returns `true` if both sides are present.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, MatchState::Matched { .. })
    }

    /// Returns the primary single view's node, if present.
    #[must_use]
    pub const fn primary(&self) -> Option<NodeId> {
        match self {
            MatchState::Matched { primary, .. } | MatchState::PrimaryOnly(primary) => {
                Some(*primary)
            }
            MatchState::SecondaryOnly(_) => None,
        }
    }

    /// Returns the secondary single view's node, if present.
    #[must_use]
    pub const fn secondary(&self) -> Option<NodeId> {
        match self {
            MatchState::Matched { secondary, .. } | MatchState::SecondaryOnly(secondary) => {
                Some(*secondary)
            }
            MatchState::PrimaryOnly(_) => None,
        }
    }

    /// Returns the single view's node on the given side, if present.
    #[must_use]
    pub const fn side(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Primary => self.primary(),
            Side::Secondary => self.secondary(),
        }
    }
}

/// Which neighborhood a proximity proxy folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProxyDirection {
    /// The proxy folds hidden predecessors of its anchor.
    Parents,
    /// The proxy folds hidden successors of its anchor.
    Children,
}

/// A collapsible proxy standing in for a hidden neighborhood.
///
/// One proxy exists per visible anchor node and direction that has hidden
/// neighbors at the proximity boundary. Every hidden boundary node is claimed
/// by exactly one proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyNode {
    /// The visible node whose hidden neighbors this proxy folds.
    pub anchor: NodeId,
    /// Whether the folded neighbors are parents or children of the anchor.
    pub direction: ProxyDirection,
    /// The hidden nodes behind this proxy, in ascending arena order.
    pub hidden: Vec<NodeId>,
}

impl ProxyNode {
    /// Returns the number of hidden nodes behind this proxy.
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }
}

/// The content of a single-view node: a raw node or a proximity proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleContent {
    /// A raw node of this side, identified by address.
    Real(Address),
    /// A proximity proxy.
    Proxy(ProxyNode),
}

/// One raw node of one side, as presented in that side's view.
///
/// Exactly one `SingleDiffNode` exists per raw node per side per view instance;
/// nodes are never shared across views. Correspondence with the other tiers is
/// through the `combined` and `super_node` indices only.
#[derive(Debug, Clone)]
pub struct SingleDiffNode {
    content: SingleContent,
    side: Side,
    /// Index of the overlay position in the combined view, if any.
    combined: Option<NodeId>,
    /// Index of the layout-skeleton position in the super view, if any.
    super_node: Option<NodeId>,
    visible: bool,
    selected: bool,
}

impl SingleDiffNode {
    /// Creates a visible, unselected node wrapping a raw node.
    #[must_use]
    pub fn new(side: Side, address: Address) -> Self {
        Self {
            content: SingleContent::Real(address),
            side,
            combined: None,
            super_node: None,
            visible: true,
            selected: false,
        }
    }

    /// Creates a visible proxy node on the same side as this node's view.
    #[must_use]
    pub fn new_proxy(side: Side, proxy: ProxyNode) -> Self {
        Self {
            content: SingleContent::Proxy(proxy),
            side,
            combined: None,
            super_node: None,
            visible: true,
            selected: false,
        }
    }

    /// Returns the node content.
    #[must_use]
    pub const fn content(&self) -> &SingleContent {
        &self.content
    }

    /// Returns the raw node address, or `None` for a proxy.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match &self.content {
            SingleContent::Real(address) => Some(*address),
            SingleContent::Proxy(_) => None,
        }
    }

    /// Returns the proxy content, or `None` for a raw node.
    #[must_use]
    pub const fn proxy(&self) -> Option<&ProxyNode> {
        match &self.content {
            SingleContent::Proxy(proxy) => Some(proxy),
            SingleContent::Real(_) => None,
        }
    }

    /// Returns `true` if this node is a proximity proxy.
    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self.content, SingleContent::Proxy(_))
    }

    /// Returns the side this node belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the combined view's node for this position, if any.
    #[must_use]
    pub const fn combined(&self) -> Option<NodeId> {
        self.combined
    }

    /// Returns the super view's node for this position, if any.
    #[must_use]
    pub const fn super_node(&self) -> Option<NodeId> {
        self.super_node
    }

    pub(crate) fn set_combined(&mut self, combined: Option<NodeId>) {
        self.combined = combined;
    }

    pub(crate) fn set_super_node(&mut self, super_node: Option<NodeId>) {
        self.super_node = super_node;
    }

    /// Returns `true` if this node is currently visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns `true` if this node is currently selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// The content of a combined-view node: an overlay position or a proximity
/// proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinedContent {
    /// One matched-or-unmatched position of the overlay.
    Real {
        /// The position's correspondence key.
        pair: AddressPair,
        /// The position's links into the single views.
        state: MatchState,
    },
    /// A proximity proxy.
    Proxy(ProxyNode),
}

/// One overlay position: a node of the combined view.
///
/// A matched position links both single views; a one-sided position links one.
/// The pair and the state always agree: the pair has an address exactly on the
/// sides the state has a link.
#[derive(Debug, Clone)]
pub struct CombinedDiffNode {
    content: CombinedContent,
    /// Index of the layout-skeleton position in the super view, if any.
    super_node: Option<NodeId>,
    visible: bool,
    selected: bool,
}

impl CombinedDiffNode {
    /// Creates a visible, unselected overlay position.
    #[must_use]
    pub fn new(pair: AddressPair, state: MatchState) -> Self {
        Self {
            content: CombinedContent::Real { pair, state },
            super_node: None,
            visible: true,
            selected: false,
        }
    }

    /// Creates a visible proxy node.
    #[must_use]
    pub fn new_proxy(proxy: ProxyNode) -> Self {
        Self {
            content: CombinedContent::Proxy(proxy),
            super_node: None,
            visible: true,
            selected: false,
        }
    }

    /// Returns the node content.
    #[must_use]
    pub const fn content(&self) -> &CombinedContent {
        &self.content
    }

    /// Returns the position's correspondence key, or `None` for a proxy.
    #[must_use]
    pub const fn pair(&self) -> Option<AddressPair> {
        match &self.content {
            CombinedContent::Real { pair, .. } => Some(*pair),
            CombinedContent::Proxy(_) => None,
        }
    }

    /// Returns the position's single-view links, or `None` for a proxy.
    #[must_use]
    pub const fn state(&self) -> Option<&MatchState> {
        match &self.content {
            CombinedContent::Real { state, .. } => Some(state),
            CombinedContent::Proxy(_) => None,
        }
    }

    /// Returns the proxy content, or `None` for a real position.
    #[must_use]
    pub const fn proxy(&self) -> Option<&ProxyNode> {
        match &self.content {
            CombinedContent::Proxy(proxy) => Some(proxy),
            CombinedContent::Real { .. } => None,
        }
    }

    /// Returns `true` if this node is a proximity proxy.
    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self.content, CombinedContent::Proxy(_))
    }

    /// Returns `true` if this position is matched (both sides present).
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.state().is_some_and(MatchState::is_matched)
    }

    /// Returns the super view's node for this position, if any.
    #[must_use]
    pub const fn super_node(&self) -> Option<NodeId> {
        self.super_node
    }

    pub(crate) fn set_super_node(&mut self, super_node: Option<NodeId>) {
        self.super_node = super_node;
    }

    /// Replaces the position's key and links, preserving flags.
    pub(crate) fn set_real_content(&mut self, pair: AddressPair, state: MatchState) {
        self.content = CombinedContent::Real { pair, state };
    }

    /// Returns `true` if this node is currently visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns `true` if this node is currently selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// One layout-skeleton position: a node of the super view.
///
/// Carries the same side-link pattern as its combined node but no renderable
/// payload; it exists to drive size and position consensus between the views
/// and is never shown as content.
#[derive(Debug, Clone)]
pub struct SuperDiffNode {
    state: MatchState,
    /// Index of the overlay position in the combined view.
    combined: NodeId,
    visible: bool,
    selected: bool,
}

impl SuperDiffNode {
    /// Creates a visible, unselected skeleton position.
    #[must_use]
    pub fn new(state: MatchState, combined: NodeId) -> Self {
        Self {
            state,
            combined,
            visible: true,
            selected: false,
        }
    }

    /// Returns the position's single-view links.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// Returns `true` if this position is matched.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.state.is_matched()
    }

    pub(crate) fn set_state(&mut self, state: MatchState) {
        self.state = state;
    }

    /// Returns the combined view's node for this position.
    #[must_use]
    pub const fn combined(&self) -> NodeId {
        self.combined
    }

    /// Returns `true` if this node is currently visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns `true` if this node is currently selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_state_sides() {
        let matched = MatchState::Matched {
            primary: NodeId::new(1),
            secondary: NodeId::new(2),
        };
        assert!(matched.is_matched());
        assert_eq!(matched.primary(), Some(NodeId::new(1)));
        assert_eq!(matched.secondary(), Some(NodeId::new(2)));
        assert_eq!(matched.side(Side::Primary), Some(NodeId::new(1)));

        let primary = MatchState::PrimaryOnly(NodeId::new(3));
        assert!(!primary.is_matched());
        assert_eq!(primary.secondary(), None);

        let secondary = MatchState::SecondaryOnly(NodeId::new(4));
        assert_eq!(secondary.primary(), None);
        assert_eq!(secondary.side(Side::Secondary), Some(NodeId::new(4)));
    }

    #[test]
    fn test_single_node_content() {
        let node = SingleDiffNode::new(Side::Primary, Address::new(0x1000));
        assert_eq!(node.address(), Some(Address::new(0x1000)));
        assert!(!node.is_proxy());
        assert!(node.is_visible());
        assert!(!node.is_selected());

        let proxy = SingleDiffNode::new_proxy(
            Side::Primary,
            ProxyNode {
                anchor: NodeId::new(0),
                direction: ProxyDirection::Children,
                hidden: vec![NodeId::new(5)],
            },
        );
        assert!(proxy.is_proxy());
        assert_eq!(proxy.address(), None);
        assert_eq!(proxy.proxy().map(ProxyNode::hidden_count), Some(1));
    }

    #[test]
    fn test_combined_node_matched_state() {
        let pair = AddressPair::matched(Address::new(0x1000), Address::new(0x2000));
        let node = CombinedDiffNode::new(
            pair,
            MatchState::Matched {
                primary: NodeId::new(0),
                secondary: NodeId::new(0),
            },
        );
        assert!(node.is_matched());
        assert_eq!(node.pair(), Some(pair));

        let one_sided = CombinedDiffNode::new(
            AddressPair::primary_only(Address::new(0x1000)),
            MatchState::PrimaryOnly(NodeId::new(0)),
        );
        assert!(!one_sided.is_matched());
    }
}
