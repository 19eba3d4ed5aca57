//! Majors list and platform-admin major maintenance.

use axum::extract::{Path, State};
use axum::Json;
use bobcats_common::models::NoPayload;
use bobcats_common::{ActionResponse, Major};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ok, ActionResult};
use crate::auth::AdminUser;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MajorBody {
    pub name: String,
}

/// GET /api/majors
pub async fn list_majors(State(state): State<SharedState>) -> ActionResult<Value> {
    let majors = state.majors.list().await?;
    ok(json!({ "majors": majors }))
}

/// POST /api/majors
pub async fn create_major(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(body): Json<MajorBody>,
) -> ActionResult<Major> {
    ok(state.majors.create(&body.name).await?)
}

/// PUT or PATCH /api/majors/{id}
pub async fn rename_major(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MajorBody>,
) -> ActionResult<Major> {
    ok(state.majors.rename(id, &body.name).await?)
}

/// DELETE /api/majors/{id}
pub async fn delete_major(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ActionResult<NoPayload> {
    state.majors.delete(id).await?;
    Ok(Json(ActionResponse::done()))
}
