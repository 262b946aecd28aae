//! Edge wrappers of the three view tiers.
//!
//! Edges mirror the nodes: each tier owns its own edge type, and a combined
//! edge's matched-state is derived from whether both of its side edges are
//! present, never stored independently.

use crate::{
    graph::EdgeId,
    program::FlowEdgeKind,
    views::Side,
};

/// The kind of relationship an edge in a diff view represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffEdgeKind {
    /// A control flow edge of a flow-graph view.
    Flow(FlowEdgeKind),
    /// A call edge of a call-graph view.
    Call,
    /// An attachment edge between a visible node and its proximity proxy.
    Proximity,
}

/// One raw edge of one side, as presented in that side's view.
#[derive(Debug, Clone)]
pub struct SingleDiffEdge {
    kind: DiffEdgeKind,
    /// Index of the overlay edge in the combined view, if any.
    combined: Option<EdgeId>,
    visible: bool,
}

impl SingleDiffEdge {
    /// Creates a visible edge of the given kind.
    #[must_use]
    pub const fn new(kind: DiffEdgeKind) -> Self {
        Self {
            kind,
            combined: None,
            visible: true,
        }
    }

    /// Returns the edge kind.
    #[must_use]
    pub const fn kind(&self) -> DiffEdgeKind {
        self.kind
    }

    /// Returns the combined view's edge overlaying this one, if any.
    #[must_use]
    pub const fn combined(&self) -> Option<EdgeId> {
        self.combined
    }

    pub(crate) fn set_combined(&mut self, combined: Option<EdgeId>) {
        self.combined = combined;
    }

    /// Returns `true` if this edge is currently visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// One overlay edge of the combined view.
///
/// Holds the single-view edges it overlays. Both present means the edge exists
/// on both sides between matched endpoints; exactly one present means the edge
/// exists on that side only.
#[derive(Debug, Clone)]
pub struct CombinedDiffEdge {
    kind: DiffEdgeKind,
    /// The primary single view's edge, if the edge exists on that side.
    primary: Option<EdgeId>,
    /// The secondary single view's edge, if the edge exists on that side.
    secondary: Option<EdgeId>,
    /// Index of the skeleton edge in the super view, if any.
    super_edge: Option<EdgeId>,
    visible: bool,
}

impl CombinedDiffEdge {
    /// Creates a visible overlay edge over the given side edges.
    ///
    /// Overlay edges built from raw edges carry at least one side; proxy
    /// attachment edges carry none.
    #[must_use]
    pub const fn new(kind: DiffEdgeKind, primary: Option<EdgeId>, secondary: Option<EdgeId>) -> Self {
        Self {
            kind,
            primary,
            secondary,
            super_edge: None,
            visible: true,
        }
    }

    /// Returns the edge kind.
    #[must_use]
    pub const fn kind(&self) -> DiffEdgeKind {
        self.kind
    }

    /// Returns the primary single view's edge, if present.
    #[must_use]
    pub const fn primary(&self) -> Option<EdgeId> {
        self.primary
    }

    /// Returns the secondary single view's edge, if present.
    #[must_use]
    pub const fn secondary(&self) -> Option<EdgeId> {
        self.secondary
    }

    /// Returns the single view's edge on the given side, if present.
    #[must_use]
    pub const fn side(&self, side: Side) -> Option<EdgeId> {
        match side {
            Side::Primary => self.primary,
            Side::Secondary => self.secondary,
        }
    }

    /// Returns `true` if the edge exists on both sides.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }

    /// Drops one side's edge reference, degrading the overlay to one-sided.
    pub(crate) fn clear_side(&mut self, side: Side) {
        match side {
            Side::Primary => self.primary = None,
            Side::Secondary => self.secondary = None,
        }
    }

    /// Returns the super view's edge mirroring this one, if any.
    #[must_use]
    pub const fn super_edge(&self) -> Option<EdgeId> {
        self.super_edge
    }

    pub(crate) fn set_super_edge(&mut self, super_edge: Option<EdgeId>) {
        self.super_edge = super_edge;
    }

    /// Returns `true` if this edge is currently visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// One skeleton edge of the super view, mirroring a combined edge.
#[derive(Debug, Clone)]
pub struct SuperDiffEdge {
    /// The combined view's edge this one mirrors.
    combined: EdgeId,
}

impl SuperDiffEdge {
    /// Creates a skeleton edge mirroring the given combined edge.
    #[must_use]
    pub const fn new(combined: EdgeId) -> Self {
        Self { combined }
    }

    /// Returns the combined view's edge this one mirrors.
    #[must_use]
    pub const fn combined(&self) -> EdgeId {
        self.combined
    }
}
