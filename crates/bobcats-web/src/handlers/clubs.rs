//! Public club catalog and platform-admin club management endpoints.

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use bobcats_clubs::{ClubDetail, ClubForm, ClubPatch, ClubQuery};
use bobcats_common::models::NoPayload;
use bobcats_common::{ActionResponse, ImageKind};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::images::read_file_field;
use super::{ok, ActionResult};
use crate::auth::{AdminUser, Caller};
use crate::state::SharedState;

// ── Catalog ───────────────────────────────────────────────────────────────────

/// GET /api/clubs?major_id=&search=&limit=&offset=
pub async fn browse(State(state): State<SharedState>, Query(query): Query<ClubQuery>) -> ActionResult<Value> {
    let clubs = state.clubs.browse(&query).await?;
    ok(json!({ "clubs": clubs }))
}

/// GET /api/clubs/{club_id}
///
/// Inactive clubs are only shown to platform admins.
pub async fn get_club(
    State(state): State<SharedState>,
    caller: Caller,
    Path(club_id): Path<Uuid>,
) -> ActionResult<Value> {
    let club = state.clubs.detail(club_id, caller.is_admin).await?;
    ok(json!({ "club": club }))
}

/// GET /api/clubs/by-slug/{slug}
pub async fn get_club_by_slug(State(state): State<SharedState>, Path(slug): Path<String>) -> ActionResult<Value> {
    let club = state.clubs.by_slug(&slug).await?;
    ok(json!({ "club": club }))
}

// ── Admin ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminPageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/admin/clubs
pub async fn admin_list(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Query(page): Query<AdminPageQuery>,
) -> ActionResult<Value> {
    let clubs = state.clubs.admin_list(page.limit, page.offset).await?;
    ok(json!({ "clubs": clubs }))
}

/// POST /api/admin/clubs
pub async fn create_club(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(form): Json<ClubForm>,
) -> ActionResult<ClubDetail> {
    ok(state.clubs.create(&form).await?)
}

/// GET /api/admin/clubs/{club_id}
pub async fn admin_get_club(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(club_id): Path<Uuid>,
) -> ActionResult<ClubDetail> {
    ok(state.clubs.detail(club_id, true).await?)
}

/// PATCH /api/admin/clubs/{club_id}
pub async fn update_club(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(club_id): Path<Uuid>,
    Json(patch): Json<ClubPatch>,
) -> ActionResult<ClubDetail> {
    ok(state.clubs.update(club_id, &patch).await?)
}

/// DELETE /api/admin/clubs/{club_id}
pub async fn delete_club(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(club_id): Path<Uuid>,
) -> ActionResult<NoPayload> {
    state.clubs.delete(club_id).await?;
    Ok(Json(ActionResponse::done()))
}

/// POST /api/admin/clubs/{club_id}/images/{logo|banner}
pub async fn upload_club_image(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path((club_id, kind)): Path<(Uuid, String)>,
    multipart: Multipart,
) -> ActionResult<Value> {
    let kind: ImageKind = kind.parse()?;
    let upload = read_file_field(multipart).await?;
    let url = state.clubs.upload_image(club_id, kind, upload).await?;
    ok(json!({ "url": url }))
}
