//! Multipart logo/banner upload for club requests, and the form reader
//! shared with club image uploads.

use axum::extract::{Multipart, Path, State};
use bobcats_clubs::ImageUpload;
use bobcats_common::{BobcatsError, ImageKind};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ok, ActionResult};
use crate::auth::CurrentUser;
use crate::state::SharedState;

/// Request bodies on the upload route may be this large, so oversized
/// images reach validation instead of being cut off by the body limit.
pub const UPLOAD_BODY_LIMIT: usize = 4 * 1024 * 1024;

const FILE_FIELD: &str = "file";

pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<ImageUpload, BobcatsError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BobcatsError::validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| BobcatsError::validation(format!("Invalid upload: {e}")))?;
        return Ok(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
    }
    Err(BobcatsError::validation("No file provided"))
}

/// POST /api/club-requests/{id}/images/{kind}
pub async fn upload(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path((id, kind)): Path<(Uuid, String)>,
    multipart: Multipart,
) -> ActionResult<Value> {
    let kind: ImageKind = kind.parse()?;
    let upload = read_file_field(multipart).await?;
    let url = state.requests.upload_image(&actor, id, kind, upload).await?;
    ok(json!({ "url": url }))
}
