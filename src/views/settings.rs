//! Per-container view configuration.
//!
//! Settings are an explicit value passed into view construction. Nothing in the
//! view layer reads ambient configuration.

/// The layout algorithm requested for a view.
///
/// Layout computation itself is a collaborator concern; the view layer only
/// records the choice and hands it to the layout engine together with the
/// visible subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutStyle {
    /// Layered top-down layout.
    #[default]
    Hierarchic,
    /// Orthogonal edge routing.
    Orthogonal,
    /// Circular grouping.
    Circular,
}

/// Configuration of one [`GraphsContainer`](crate::views::GraphsContainer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    /// Whether proximity browsing starts enabled.
    pub proximity_enabled: bool,
    /// Visible depth below the anchor set when proximity browsing.
    pub child_depth: u32,
    /// Visible depth above the anchor set when proximity browsing.
    pub parent_depth: u32,
    /// The requested layout algorithm.
    pub layout: LayoutStyle,
    /// Capacity of each view's selection undo/redo history.
    pub history_capacity: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            proximity_enabled: false,
            child_depth: 2,
            parent_depth: 2,
            layout: LayoutStyle::Hierarchic,
            history_capacity: 30,
        }
    }
}
