//! Built-in degrees (career paths plus prerequisite catalogs), with optional
//! extra paths loaded from a directory of `<id>.json` files.
//!
//! The un-prefixed lookups (`path`, `courses`, ...) read the CS/CSE degree.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{CareerError, Result};
use crate::model::{CareerPath, CareerSummary, CatalogCourse, Degree, DegreeSummary};

pub const DEFAULT_DEGREE: &str = "cs-cse";

const BUILTIN_DEGREES: &[(&str, &str)] = &[
    ("cogs", include_str!("../data/degrees/cogs.json")),
    ("cs-cse", include_str!("../data/degrees/cs-cse.json")),
    ("data-science-analytics", include_str!("../data/degrees/data-science-analytics.json")),
    ("electrical-engineering", include_str!("../data/degrees/electrical-engineering.json")),
    ("mechanical-engineering", include_str!("../data/degrees/mechanical-engineering.json")),
    ("political-science", include_str!("../data/degrees/political-science.json")),
];

#[derive(Debug, Clone, Default)]
pub struct CareerCatalog {
    degrees: BTreeMap<String, Degree>,
}

impl CareerCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut degrees = BTreeMap::new();
        for (id, text) in BUILTIN_DEGREES {
            let degree: Degree = serde_json::from_str(text)
                .map_err(|source| CareerError::InvalidData { source_name: format!("{id}.json"), source })?;
            degrees.insert((*id).to_string(), degree);
        }
        Ok(Self { degrees })
    }

    /// Add or replace career paths from `dir`. Top-level `*.json` files join
    /// the CS/CSE degree; files under `<degree>/` join that degree, which is
    /// created when unknown. The file stem is the path id. Unreadable files
    /// are skipped with a warning.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut loaded = self.load_paths(DEFAULT_DEGREE, dir)?;

        let entries = std::fs::read_dir(dir)
            .map_err(|source| CareerError::Io { path: dir.display().to_string(), source })?;
        for entry in entries.flatten() {
            let sub = entry.path();
            if !sub.is_dir() {
                continue;
            }
            let Some(degree) = sub.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            loaded += self.load_paths(&degree, &sub)?;
        }
        info!(dir = %dir.display(), loaded, "loaded extra career paths");
        Ok(loaded)
    }

    fn load_paths(&mut self, degree_id: &str, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .map_err(|source| CareerError::Io { path: dir.display().to_string(), source })?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match std::fs::read_to_string(&path)
                .map_err(|source| CareerError::Io { path: path.display().to_string(), source })
                .and_then(|text| {
                    serde_json::from_str::<CareerPath>(&text).map_err(|source| CareerError::InvalidData {
                        source_name: path.display().to_string(),
                        source,
                    })
                }) {
                Ok(career) => {
                    self.degrees
                        .entry(degree_id.to_string())
                        .or_insert_with(|| Degree { name: degree_id.to_string(), ..Degree::default() })
                        .careers
                        .insert(id, career);
                    loaded += 1;
                }
                Err(e) => warn!(error = %e, degree = degree_id, "skipping career path file"),
            }
        }
        Ok(loaded)
    }

    // ── Degrees ───────────────────────────────────────────────────────────────

    pub fn degrees(&self) -> Vec<DegreeSummary> {
        self.degrees
            .iter()
            .map(|(id, d)| DegreeSummary {
                id: id.clone(),
                name: d.name.clone(),
                career_count: d.careers.len(),
                course_count: d.courses.len(),
            })
            .collect()
    }

    pub fn degree(&self, id: &str) -> Result<&Degree> {
        self.degrees.get(id).ok_or_else(|| CareerError::DegreeNotFound(id.to_string()))
    }

    pub fn degree_path(&self, degree_id: &str, id: &str) -> Result<&CareerPath> {
        self.degree(degree_id)?
            .careers
            .get(id)
            .ok_or_else(|| CareerError::PathNotFound(id.to_string()))
    }

    pub fn degree_course(&self, degree_id: &str, id: &str) -> Result<&CatalogCourse> {
        self.degree(degree_id)?
            .courses
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CareerError::CourseNotFound(id.to_string()))
    }

    // ── CS/CSE shorthands ─────────────────────────────────────────────────────

    pub fn path(&self, id: &str) -> Result<&CareerPath> { self.degree_path(DEFAULT_DEGREE, id) }

    pub fn summaries(&self) -> Vec<CareerSummary> {
        self.degree(DEFAULT_DEGREE).map(Degree::career_summaries).unwrap_or_default()
    }

    pub fn courses(&self) -> &[CatalogCourse] {
        self.degrees.get(DEFAULT_DEGREE).map(|d| d.courses.as_slice()).unwrap_or_default()
    }

    pub fn course(&self, id: &str) -> Result<&CatalogCourse> { self.degree_course(DEFAULT_DEGREE, id) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tier_number;
    use crate::model::Semester;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = CareerCatalog::builtin().unwrap();
        let ids: Vec<String> = catalog.summaries().into_iter().map(|s| s.id).collect();
        for id in ["cybersecurity", "swe", "ml-ai", "datascience"] {
            assert!(ids.iter().any(|i| i == id), "missing {id}");
        }
        let cyber = catalog.path("cybersecurity").unwrap();
        assert_eq!(cyber.root_label, "Cybersecurity");
        assert!(cyber.categories.iter().all(|c| c.id.starts_with("tier-")));
        assert!(cyber.tier_courses(1.0).count() > 0);
    }

    #[test]
    fn test_every_degree_is_listed() {
        let catalog = CareerCatalog::builtin().unwrap();
        let degrees = catalog.degrees();
        let ids: Vec<&str> = degrees.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "cogs",
                "cs-cse",
                "data-science-analytics",
                "electrical-engineering",
                "mechanical-engineering",
                "political-science",
            ]
        );
        assert!(degrees.iter().all(|d| d.career_count > 0));
        let with_catalog: Vec<&str> =
            degrees.iter().filter(|d| d.course_count > 0).map(|d| d.id.as_str()).collect();
        assert_eq!(with_catalog, ["cogs", "cs-cse", "mechanical-engineering", "political-science"]);
    }

    #[test]
    fn test_degree_lookups() {
        let catalog = CareerCatalog::builtin().unwrap();
        let law = catalog.degree_path("political-science", "law-pre-law").unwrap();
        assert_eq!(law.root_label, "Law / Pre-Law");
        assert_eq!(law.categories.len(), 3);
        assert!(law.tier_courses(1.0).any(|c| c.id == "poli-102"));

        assert_eq!(catalog.degree("cogs").unwrap().name, "Cognitive Science");
        assert_eq!(catalog.degree_course("cogs", "cogs-001").unwrap().semester, Semester::Fall);
        assert!(matches!(catalog.degree("history"), Err(CareerError::DegreeNotFound(_))));
        assert!(matches!(catalog.degree_path("cogs", "cybersecurity"), Err(CareerError::PathNotFound(_))));
        assert!(matches!(catalog.degree_course("electrical-engineering", "ee-021"), Err(CareerError::CourseNotFound(_))));
    }

    #[test]
    fn test_every_tier_category_has_a_number() {
        let catalog = CareerCatalog::builtin().unwrap();
        let embedded = catalog.path("embedded-systems").unwrap();
        assert!(embedded.categories.iter().any(|c| c.id == "tier-1-5"));
        assert!(embedded.tier_courses(1.5).count() > 0);
        for degree in catalog.degrees() {
            for (id, path) in &catalog.degree(&degree.id).unwrap().careers {
                for category in &path.categories {
                    assert!(tier_number(&category.id) > 0.0, "{}/{id}: {}", degree.id, category.id);
                }
            }
        }
    }

    #[test]
    fn test_course_lookup() {
        let catalog = CareerCatalog::builtin().unwrap();
        let course = catalog.course("cse-022").unwrap();
        assert_eq!(course.year, 1);
        assert_eq!(course.semester, Semester::Fall);
        assert!(matches!(catalog.course("cse-999"), Err(CareerError::CourseNotFound(_))));
        assert!(matches!(catalog.path("law"), Err(CareerError::PathNotFound(_))));
    }

    #[test]
    fn test_load_dir_adds_paths_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("robotics.json"),
            r#"{"rootLabel":"Robotics","categories":[{"id":"tier-1","label":"Core"}],
                "courses":[{"id":"me-021","code":"ME 021","name":"Statics","fullName":"ME 021: Statics","tier":1}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("history")).unwrap();
        std::fs::write(
            dir.path().join("history").join("archivist.json"),
            r#"{"rootLabel":"Archivist","categories":[],"courses":[]}"#,
        )
        .unwrap();

        let mut catalog = CareerCatalog::builtin().unwrap();
        assert_eq!(catalog.load_dir(dir.path()).unwrap(), 2);
        assert_eq!(catalog.path("robotics").unwrap().courses.len(), 1);
        assert!(catalog.path("broken").is_err());
        assert_eq!(catalog.degree_path("history", "archivist").unwrap().root_label, "Archivist");
        assert_eq!(catalog.degree("history").unwrap().name, "history");
    }
}
