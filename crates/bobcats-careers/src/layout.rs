//! Tier → course coordinate layout for a career path graph.
//!
//! Root sits at (0, 40). Tiers share one row at y = 220, centered on x = 0.
//! Courses of an expanded tier hang below it in centered rows. Every
//! position can be replaced by an override; course defaults are computed
//! from the tier's final position, so moving a tier drags its courses along.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::CareerPath;

lazy_static! {
    static ref TIER_ID: Regex = Regex::new(r"tier-(\d+)(?:-(\d+))?").unwrap();
}

pub const ROOT_POSITION: Position = Position { x: 0.0, y: 40.0 };
pub const TIER_Y: f64 = 220.0;
pub const COURSE_OFFSET_Y: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Compact,
    Formatted,
}

impl LayoutMode {
    pub fn tier_spacing(self) -> f64 {
        match self { LayoutMode::Compact => 400.0, LayoutMode::Formatted => 600.0 }
    }

    pub fn courses_per_row(self) -> usize {
        match self { LayoutMode::Compact => 3, LayoutMode::Formatted => 2 }
    }

    pub fn course_spacing(self) -> f64 {
        match self { LayoutMode::Compact => 220.0, LayoutMode::Formatted => 300.0 }
    }

    pub fn row_spacing(self) -> f64 {
        match self { LayoutMode::Compact => 100.0, LayoutMode::Formatted => 120.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Tier,
    Course,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub position: Position,
    /// Tier nodes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLayout {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphLayout {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Tier number from a category id: `tier-2` is 2, `tier-1-5` is 1.5, and
/// an id without a tier is 0.
pub fn tier_number(category_id: &str) -> f64 {
    let Some(caps) = TIER_ID.captures(category_id) else {
        return 0.0;
    };
    let text = match (caps.get(1), caps.get(2)) {
        (Some(whole), Some(frac)) => format!("{}.{}", whole.as_str(), frac.as_str()),
        (Some(whole), None) => whole.as_str().to_string(),
        _ => return 0.0,
    };
    text.parse().unwrap_or(0.0)
}

pub fn root_node_id(graph_id: &str) -> String { format!("{graph_id}-root") }

pub fn course_node_id(course_id: &str) -> String { format!("course-{course_id}") }

/// Default x of the `index`-th of `count` tiers.
pub fn tier_x(index: usize, count: usize, mode: LayoutMode) -> f64 {
    let spacing = mode.tier_spacing();
    let start = -((count.saturating_sub(1)) as f64 * spacing) / 2.0;
    start + index as f64 * spacing
}

/// Default position of the `index`-th of `count` courses under a tier.
pub fn course_position(tier: Position, index: usize, count: usize, mode: LayoutMode) -> Position {
    let per_row = mode.courses_per_row();
    let row = index / per_row;
    let col = index % per_row;
    let in_row = per_row.min(count - row * per_row);
    let center_offset = (in_row - 1) as f64 * mode.course_spacing() / 2.0;
    Position {
        x: tier.x + col as f64 * mode.course_spacing() - center_offset,
        y: tier.y + COURSE_OFFSET_Y + row as f64 * mode.row_spacing(),
    }
}

/// Build the node/edge set for `path`.
pub fn layout(
    graph_id: &str,
    path: &CareerPath,
    expanded: &BTreeSet<String>,
    overrides: &BTreeMap<String, Position>,
    mode: LayoutMode,
) -> GraphLayout {
    let place = |id: &str, default: Position| overrides.get(id).copied().unwrap_or(default);

    let root_id = root_node_id(graph_id);
    let mut nodes = vec![GraphNode {
        id: root_id.clone(),
        kind: NodeKind::Root,
        label: path.root_label.clone(),
        position: place(&root_id, ROOT_POSITION),
        expanded: None,
    }];
    let mut edges = Vec::new();

    let count = path.categories.len();
    for (index, category) in path.categories.iter().enumerate() {
        let is_expanded = expanded.contains(&category.id);
        let tier_pos = place(&category.id, Position::new(tier_x(index, count, mode), TIER_Y));
        nodes.push(GraphNode {
            id: category.id.clone(),
            kind: NodeKind::Tier,
            label: category.label.clone(),
            position: tier_pos,
            expanded: Some(is_expanded),
        });
        edges.push(GraphEdge {
            id: format!("{root_id}-{}", category.id),
            source: root_id.clone(),
            target: category.id.clone(),
        });

        if !is_expanded {
            continue;
        }
        let courses: Vec<_> = path.tier_courses(tier_number(&category.id)).collect();
        for (i, course) in courses.iter().enumerate() {
            let node_id = course_node_id(&course.id);
            let position = place(&node_id, course_position(tier_pos, i, courses.len(), mode));
            edges.push(GraphEdge {
                id: format!("{}-{}", category.id, node_id),
                source: category.id.clone(),
                target: node_id.clone(),
            });
            nodes.push(GraphNode {
                id: node_id,
                kind: NodeKind::Course,
                label: course.code.clone(),
                position,
                expanded: None,
            });
        }
    }

    GraphLayout { nodes, edges }
}

/// Formatted positions of every visible node, ignoring existing overrides.
pub fn formatted_positions(graph_id: &str, path: &CareerPath, expanded: &BTreeSet<String>) -> BTreeMap<String, Position> {
    layout(graph_id, path, expanded, &BTreeMap::new(), LayoutMode::Formatted)
        .nodes
        .into_iter()
        .map(|n| (n.id, n.position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CareerCourse, TierCategory};

    fn course(id: &str, tier: f64) -> CareerCourse {
        CareerCourse {
            id: id.into(),
            code: id.to_uppercase(),
            name: id.into(),
            full_name: id.into(),
            description: None,
            tier,
            expanded_info: None,
            prerequisites: Vec::new(),
        }
    }

    fn sample() -> CareerPath {
        CareerPath {
            root_label: "Software Engineering".into(),
            categories: (1..=3)
                .map(|n| TierCategory { id: format!("tier-{n}"), label: format!("Tier {n}"), emoji: None })
                .collect(),
            courses: vec![
                course("a", 1.0), course("b", 1.0), course("c", 1.0), course("d", 1.0), course("e", 1.0),
                course("f", 2.0),
            ],
            category_intros: BTreeMap::new(),
        }
    }

    fn expanded(ids: &[&str]) -> BTreeSet<String> { ids.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn test_tier_number() {
        assert_eq!(tier_number("tier-3"), 3.0);
        assert_eq!(tier_number("tier-12"), 12.0);
        assert_eq!(tier_number("tier-2-5"), 2.5);
        assert_eq!(tier_number("electives"), 0.0);
    }

    #[test]
    fn test_collapsed_layout() {
        let g = layout("swe", &sample(), &BTreeSet::new(), &BTreeMap::new(), LayoutMode::Compact);
        assert_eq!(g.nodes.len(), 4);
        assert_eq!(g.edges.len(), 3);
        assert_eq!(g.node("swe-root").unwrap().position, ROOT_POSITION);
        assert_eq!(g.node("tier-1").unwrap().position, Position::new(-400.0, 220.0));
        assert_eq!(g.node("tier-2").unwrap().position, Position::new(0.0, 220.0));
        assert_eq!(g.node("tier-3").unwrap().position, Position::new(400.0, 220.0));
    }

    #[test]
    fn test_compact_course_rows_are_centered() {
        let g = layout("swe", &sample(), &expanded(&["tier-1"]), &BTreeMap::new(), LayoutMode::Compact);
        let pos = |id: &str| g.node(&course_node_id(id)).unwrap().position;
        // Row 0: three courses around x = -400.
        assert_eq!(pos("a"), Position::new(-620.0, 370.0));
        assert_eq!(pos("b"), Position::new(-400.0, 370.0));
        assert_eq!(pos("c"), Position::new(-180.0, 370.0));
        // Row 1: two courses.
        assert_eq!(pos("d"), Position::new(-510.0, 470.0));
        assert_eq!(pos("e"), Position::new(-290.0, 470.0));
        assert!(g.edges.iter().any(|e| e.source == "tier-1" && e.target == "course-e"));
        assert_eq!(g.node("tier-1").unwrap().expanded, Some(true));
    }

    #[test]
    fn test_formatted_spacing() {
        let g = layout("swe", &sample(), &expanded(&["tier-2"]), &BTreeMap::new(), LayoutMode::Formatted);
        assert_eq!(g.node("tier-1").unwrap().position.x, -600.0);
        assert_eq!(g.node("course-f").unwrap().position, Position::new(0.0, 370.0));
    }

    #[test]
    fn test_tier_override_moves_courses() {
        let overrides = BTreeMap::from([("tier-2".to_string(), Position::new(50.0, 300.0))]);
        let g = layout("swe", &sample(), &expanded(&["tier-2"]), &overrides, LayoutMode::Compact);
        assert_eq!(g.node("tier-2").unwrap().position, Position::new(50.0, 300.0));
        assert_eq!(g.node("course-f").unwrap().position, Position::new(50.0, 450.0));
    }

    #[test]
    fn test_half_tier_owns_its_courses() {
        let mut path = sample();
        path.categories.insert(1, TierCategory { id: "tier-1-5".into(), label: "Tier 1.5".into(), emoji: None });
        path.courses.push(course("g", 1.5));
        let g = layout("swe", &path, &expanded(&["tier-1", "tier-1-5"]), &BTreeMap::new(), LayoutMode::Compact);
        assert!(g.edges.iter().any(|e| e.source == "tier-1-5" && e.target == "course-g"));
        assert!(!g.edges.iter().any(|e| e.source == "tier-1" && e.target == "course-g"));
        assert_eq!(g.node("course-g").unwrap().position.x, g.node("tier-1-5").unwrap().position.x);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let path = sample();
        let open = expanded(&["tier-1", "tier-2"]);
        let a = layout("swe", &path, &open, &BTreeMap::new(), LayoutMode::Compact);
        let b = layout("swe", &path, &open, &BTreeMap::new(), LayoutMode::Compact);
        assert_eq!(a, b);
    }
}
