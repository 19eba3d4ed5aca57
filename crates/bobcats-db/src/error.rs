//! Database error types.

use bobcats_common::BobcatsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Postgres error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt row in {table}: {detail}")]
    CorruptRow { table: &'static str, detail: String },

    #[error("Write to {0} failed")]
    WriteFailed(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let is_unique = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if is_unique {
            DbError::Duplicate(err.to_string())
        } else {
            DbError::Sqlx(err)
        }
    }
}

impl From<DbError> for BobcatsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => BobcatsError::NotFound(what),
            DbError::Duplicate(what) => BobcatsError::Conflict(what),
            other => BobcatsError::Database(other.to_string()),
        }
    }
}
