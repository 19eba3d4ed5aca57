//! Degree prerequisite graph: one node per catalog course, laid out in one
//! row per term, with an edge from each prerequisite to the course needing it.

use serde::Serialize;

use crate::layout::{LayoutMode, Position};
use crate::model::CatalogCourse;

const FIRST_TERM_Y: f64 = 160.0;
const TERM_SPACING: f64 = 140.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrereqNode {
    pub id: String,
    pub course: CatalogCourse,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrereqEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrereqGraph {
    pub nodes: Vec<PrereqNode>,
    pub edges: Vec<PrereqEdge>,
}

fn column_spacing(mode: LayoutMode) -> f64 {
    match mode { LayoutMode::Compact => 220.0, LayoutMode::Formatted => 300.0 }
}

/// Prerequisite ids that are not in `courses` produce no edge.
pub fn prerequisite_graph(courses: &[CatalogCourse], mode: LayoutMode) -> PrereqGraph {
    let mut terms: Vec<Vec<&CatalogCourse>> = vec![Vec::new(); 8];
    for course in courses {
        terms[course.term_index()].push(course);
    }

    let spacing = column_spacing(mode);
    let mut nodes = Vec::with_capacity(courses.len());
    for (term, row) in terms.iter().enumerate() {
        let start = -((row.len().saturating_sub(1)) as f64 * spacing) / 2.0;
        for (col, course) in row.iter().enumerate() {
            nodes.push(PrereqNode {
                id: course.id.clone(),
                course: (*course).clone(),
                position: Position::new(start + col as f64 * spacing, FIRST_TERM_Y + term as f64 * TERM_SPACING),
            });
        }
    }

    let edges = courses
        .iter()
        .flat_map(|course| {
            course
                .prerequisites
                .iter()
                .filter(move |p| courses.iter().any(|c| &c.id == *p))
                .map(move |p| PrereqEdge {
                    id: format!("{p}-{}", course.id),
                    source: p.clone(),
                    target: course.id.clone(),
                })
        })
        .collect();

    PrereqGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CareerCatalog;

    #[test]
    fn test_every_course_is_a_node_and_edges_join_known_courses() {
        let catalog = CareerCatalog::builtin().unwrap();
        let graph = prerequisite_graph(catalog.courses(), LayoutMode::Compact);
        assert_eq!(graph.nodes.len(), catalog.courses().len());
        assert!(!graph.edges.is_empty());

        let known = |id: &str| graph.nodes.iter().any(|n| n.id == id);
        for edge in &graph.edges {
            assert!(known(&edge.source) && known(&edge.target), "{}", edge.id);
        }
        assert!(graph.edges.iter().any(|e| e.source == "cse-022" && e.target == "cse-024"));
    }

    #[test]
    fn test_each_degree_catalog_builds_a_graph() {
        let catalog = CareerCatalog::builtin().unwrap();
        for degree in ["cogs", "mechanical-engineering", "political-science"] {
            let courses = &catalog.degree(degree).unwrap().courses;
            let graph = prerequisite_graph(courses, LayoutMode::Formatted);
            assert_eq!(graph.nodes.len(), courses.len(), "{degree}");
            assert!(!graph.edges.is_empty(), "{degree}");
        }
    }

    #[test]
    fn test_first_term_row_is_centered() {
        let catalog = CareerCatalog::builtin().unwrap();
        let graph = prerequisite_graph(catalog.courses(), LayoutMode::Compact);
        let first: Vec<f64> = graph
            .nodes
            .iter()
            .filter(|n| n.position.y == FIRST_TERM_Y)
            .map(|n| n.position.x)
            .collect();
        let sum: f64 = first.iter().sum();
        assert!(sum.abs() < 1e-9);
    }
}
