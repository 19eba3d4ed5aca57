use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ActionResponse;

#[derive(Debug, Error)]
pub enum BobcatsError {
    /// Input rejected before any I/O; the message is shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A Supabase service answered with a non-success status.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BobcatsError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
    pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }
    pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }
    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BobcatsError::Validation(_) => StatusCode::BAD_REQUEST,
            BobcatsError::NotFound(_) => StatusCode::NOT_FOUND,
            BobcatsError::Forbidden(_) => StatusCode::FORBIDDEN,
            BobcatsError::Conflict(_) => StatusCode::CONFLICT,
            BobcatsError::Unauthorized => StatusCode::UNAUTHORIZED,
            BobcatsError::Storage(_) | BobcatsError::Http(_) | BobcatsError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
            BobcatsError::Database(_)
            | BobcatsError::Serialization(_)
            | BobcatsError::Config(_)
            | BobcatsError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BobcatsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ActionResponse::failure(self.to_string()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BobcatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors_keep_message() {
        let err = BobcatsError::validation("Club name is required");
        assert_eq!(err.to_string(), "Club name is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(BobcatsError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BobcatsError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(BobcatsError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(BobcatsError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            BobcatsError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
