//! The four-tier synchronized view layer.
//!
//! For every open diff, four coordinated views share one logical set of
//! matched and unmatched positions:
//!
//! - two [`SingleGraph`]s, one per side, wrapping the raw nodes of that side;
//! - one [`CombinedGraph`], the overlay with one node per matched-or-unmatched
//!   position, linking into both single views;
//! - one [`SuperGraph`], the structural skeleton used to keep the sides' layout
//!   in sync; never rendered as content.
//!
//! All cross-view references are arena indices ([`NodeId`](crate::graph::NodeId)
//! into the *other* view's arena), never owning pointers, so no reference cycles
//! exist and disposing a view cannot leave another view holding a dangling
//! strong reference.
//!
//! [`GraphsContainer`] builds the four views from the raw graphs plus the match
//! model and applies every structural mutation (match add/remove, node
//! deletion, proximity fold/expand, selection) as a synchronous transaction
//! that either completes or leaves all views in their pre-call state.
//! [`Diff`] aggregates the containers of one session and owns disposal order.

mod combined;
mod container;
mod diff;
mod edge;
mod node;
pub(crate) mod proximity;
mod selection;
mod settings;
mod single;
mod super_graph;

pub use combined::CombinedGraph;
pub use container::{GraphsContainer, ViewKind};
pub use diff::Diff;
pub use edge::{CombinedDiffEdge, DiffEdgeKind, SingleDiffEdge, SuperDiffEdge};
pub use node::{
    CombinedContent, CombinedDiffNode, MatchState, ProxyDirection, ProxyNode, SingleContent,
    SingleDiffNode, SuperDiffNode,
};
pub use proximity::ProximityBrowser;
pub use selection::{SelectionHistory, SelectionSnapshot};
pub use settings::{LayoutStyle, ViewSettings};
pub use single::SingleGraph;
pub use super_graph::SuperGraph;

use std::fmt;

/// The two programs being diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The first ("left") program.
    Primary,
    /// The second ("right") program.
    Secondary,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn other(self) -> Side {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => write!(f, "primary"),
            Side::Secondary => write!(f, "secondary"),
        }
    }
}

/// Identifies one of the four views of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRole {
    /// The primary-side single view.
    Primary,
    /// The secondary-side single view.
    Secondary,
    /// The combined overlay view.
    Combined,
    /// The structural super view.
    Super,
}

impl ViewRole {
    /// Returns the role of a side's single view.
    #[must_use]
    pub const fn from_side(side: Side) -> Self {
        match side {
            Side::Primary => ViewRole::Primary,
            Side::Secondary => ViewRole::Secondary,
        }
    }
}
