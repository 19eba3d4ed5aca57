//! Career path and course catalog records.
//!
//! Field names follow the camelCase JSON the catalog files are written in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    pub root_label: String,
    pub categories: Vec<TierCategory>,
    pub courses: Vec<CareerCourse>,
    /// Markdown blurb shown when a tier is opened, keyed by category id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_intros: BTreeMap<String, String>,
}

impl CareerPath {
    /// Courses of one tier, in catalog order. Tiers may be fractional, e.g. 1.5.
    pub fn tier_courses(&self, tier: f64) -> impl Iterator<Item = &CareerCourse> {
        self.courses.iter().filter(move |c| (c.tier - tier).abs() < f64::EPSILON)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCategory {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerCourse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_info: Option<ExpandedInfo>,
    /// Course codes, e.g. `EE 101`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedInfo {
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub prerequisites: Option<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub career_relevance: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub real_world_applications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<CourseResources>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// Links and tools listed for self-study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseResources {
    pub videos: Vec<String>,
    pub websites: Vec<String>,
    pub tools: Vec<String>,
}

/// Short listing entry for `/api/careers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSummary {
    pub id: String,
    pub root_label: String,
    pub tier_count: usize,
    pub course_count: usize,
}

// ── Degrees ───────────────────────────────────────────────────────────────────

/// One degree program: its career paths and, where published, its
/// four-year prerequisite catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Degree {
    pub name: String,
    #[serde(default)]
    pub careers: BTreeMap<String, CareerPath>,
    #[serde(default)]
    pub courses: Vec<CatalogCourse>,
}

impl Degree {
    pub fn career_summaries(&self) -> Vec<CareerSummary> {
        self.careers
            .iter()
            .map(|(id, p)| CareerSummary {
                id: id.clone(),
                root_label: p.root_label.clone(),
                tier_count: p.categories.len(),
                course_count: p.courses.len(),
            })
            .collect()
    }
}

/// Listing entry for `/api/degrees`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeSummary {
    pub id: String,
    pub name: String,
    pub career_count: usize,
    pub course_count: usize,
}

// ── Degree course catalog ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    Fall,
    Spring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCourse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub full_name: String,
    pub year: u8,
    pub semester: Semester,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Placeholder for a requirement area rather than a single course.
    #[serde(default)]
    pub is_category: bool,
}

impl CatalogCourse {
    /// 0-based term index: year 1 fall is 0, year 4 spring is 7.
    pub fn term_index(&self) -> usize {
        let year = usize::from(self.year.clamp(1, 4)) - 1;
        year * 2 + usize::from(self.semester == Semester::Spring)
    }
}
