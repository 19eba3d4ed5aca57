//! HTTP handlers for all API routes.

pub mod admin;
pub mod careers;
pub mod clubs;
pub mod images;
pub mod majors;
pub mod members;
pub mod requests;
pub mod system;

use axum::body::Bytes;
use axum::Json;
use bobcats_common::{ActionResponse, BobcatsError};
use serde::de::DeserializeOwned;

/// `{ ok: true, ...payload }` on success, `{ ok: false, error }` otherwise.
pub type ActionResult<T> = Result<Json<ActionResponse<T>>, BobcatsError>;

pub(crate) fn ok<T>(data: T) -> ActionResult<T> {
    Ok(Json(ActionResponse::success(data)))
}

/// Parse a JSON body that may be omitted entirely.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, BobcatsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| BobcatsError::validation(format!("Invalid request body: {e}")))
}
