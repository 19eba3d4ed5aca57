//! Career path catalog and the graph layouts drawn from it.
//!
//! - [`catalog`]: degrees, their career paths (tiers and courses) and course lists
//! - [`layout`]: root → tier → course coordinates
//! - [`view`]: expanded tiers and dragged positions for one viewer
//! - [`prereq`]: degree prerequisite graph

pub mod catalog;
pub mod error;
pub mod layout;
pub mod model;
pub mod prereq;
pub mod view;

pub use catalog::{CareerCatalog, DEFAULT_DEGREE};
pub use error::{CareerError, Result};
pub use layout::{GraphLayout, LayoutMode, Position};
pub use model::{
    CareerCourse, CareerPath, CareerSummary, CatalogCourse, CourseResources, Degree, DegreeSummary, Semester,
    TierCategory,
};
pub use prereq::{prerequisite_graph, PrereqGraph};
pub use view::GraphView;
