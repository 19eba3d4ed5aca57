use bobcats_common::BobcatsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CareerError>;

#[derive(Debug, Error)]
pub enum CareerError {
    #[error("Degree not found: {0}")]
    DegreeNotFound(String),

    #[error("Career path not found: {0}")]
    PathNotFound(String),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Invalid catalog data in {source_name}: {source}")]
    InvalidData {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<CareerError> for BobcatsError {
    fn from(err: CareerError) -> Self {
        match err {
            CareerError::DegreeNotFound(_) | CareerError::PathNotFound(_) | CareerError::CourseNotFound(_) => {
                BobcatsError::NotFound(err.to_string())
            }
            other => BobcatsError::Config(other.to_string()),
        }
    }
}
