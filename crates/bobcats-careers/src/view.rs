//! Per-viewer graph state: which tiers are open and where nodes were dragged.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::layout::{formatted_positions, layout, GraphLayout, LayoutMode, Position};
use crate::model::CareerPath;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphView {
    pub expanded: BTreeSet<String>,
    pub overrides: BTreeMap<String, Position>,
    pub formatted: bool,
}

impl GraphView {
    pub fn new() -> Self { Self::default() }

    /// Open a closed tier or close an open one. Returns the new state.
    pub fn toggle(&mut self, tier_id: &str) -> bool {
        if self.expanded.remove(tier_id) {
            false
        } else {
            self.expanded.insert(tier_id.to_string());
            true
        }
    }

    /// Record where a node was dropped.
    pub fn drag_stop(&mut self, node_id: &str, position: Position) {
        self.overrides.insert(node_id.to_string(), position);
    }

    /// Collapse everything and forget all positions.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.overrides.clear();
        self.formatted = false;
    }

    /// Replace every override with the formatted layout of what is visible.
    /// Tiers opened afterwards also use formatted spacing.
    pub fn format(&mut self, graph_id: &str, path: &CareerPath) {
        self.overrides = formatted_positions(graph_id, path, &self.expanded);
        self.formatted = true;
    }

    pub fn mode(&self) -> LayoutMode {
        if self.formatted { LayoutMode::Formatted } else { LayoutMode::Compact }
    }

    pub fn render(&self, graph_id: &str, path: &CareerPath) -> GraphLayout {
        layout(graph_id, path, &self.expanded, &self.overrides, self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CareerCatalog;

    fn cyber() -> CareerPath {
        CareerCatalog::builtin().unwrap().path("cybersecurity").unwrap().clone()
    }

    #[test]
    fn test_toggle_opens_and_closes() {
        let path = cyber();
        let mut view = GraphView::new();
        assert!(view.toggle("tier-1"));
        let open = view.render("cybersecurity", &path);
        assert!(open.nodes.len() > 1 + path.categories.len());

        assert!(!view.toggle("tier-1"));
        let closed = view.render("cybersecurity", &path);
        assert_eq!(closed.nodes.len(), 1 + path.categories.len());
    }

    #[test]
    fn test_drag_override_wins_over_default() {
        let path = cyber();
        let mut view = GraphView::new();
        view.drag_stop("cybersecurity-root", Position::new(12.0, -8.0));
        let g = view.render("cybersecurity", &path);
        assert_eq!(g.node("cybersecurity-root").unwrap().position, Position::new(12.0, -8.0));
    }

    #[test]
    fn test_reset_clears_everything() {
        let path = cyber();
        let mut view = GraphView::new();
        view.toggle("tier-2");
        view.drag_stop("tier-2", Position::new(1.0, 1.0));
        view.format("cybersecurity", &path);
        view.reset();
        assert_eq!(view, GraphView::default());
    }

    #[test]
    fn test_format_overwrites_drags_and_switches_mode() {
        let path = cyber();
        let mut view = GraphView::new();
        view.toggle("tier-1");
        view.drag_stop("tier-1", Position::new(999.0, 999.0));
        view.format("cybersecurity", &path);

        assert_eq!(view.mode(), LayoutMode::Formatted);
        let g = view.render("cybersecurity", &path);
        let tier1 = g.node("tier-1").unwrap().position;
        assert_eq!(tier1.y, 220.0);
        assert_ne!(tier1.x, 999.0);
        assert!(view.overrides.keys().any(|k| k.starts_with("course-")));
    }
}
