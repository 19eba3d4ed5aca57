//! Club membership and invite endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use bobcats_common::models::NoPayload;
use bobcats_common::{ActionResponse, MemberRole};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ok, ActionResult};
use crate::auth::CurrentUser;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/clubs/{club_id}/members
pub async fn list_members(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(club_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> ActionResult<Value> {
    let page = state.membership.list_members(&actor, club_id, page.limit, page.offset).await?;
    ok(json!({ "members": page.members, "total": page.total }))
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: MemberRole,
}

/// PUT /api/clubs/{club_id}/members/{user_id}/role
pub async fn change_role(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<RoleChange>,
) -> ActionResult<NoPayload> {
    state.membership.change_role(&actor, club_id, user_id, body.role).await?;
    Ok(Json(ActionResponse::done()))
}

/// DELETE /api/clubs/{club_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
) -> ActionResult<NoPayload> {
    state.membership.remove_member(&actor, club_id, user_id).await?;
    Ok(Json(ActionResponse::done()))
}

// ── Invites ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub email: String,
    #[serde(default)]
    pub role: MemberRole,
}

/// GET /api/clubs/{club_id}/invites
pub async fn pending_invites(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(club_id): Path<Uuid>,
) -> ActionResult<Value> {
    let invites = state.membership.pending_invites(&actor, club_id).await?;
    ok(json!({ "invites": invites }))
}

/// POST /api/clubs/{club_id}/invites
pub async fn invite(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(club_id): Path<Uuid>,
    Json(body): Json<InviteBody>,
) -> ActionResult<Value> {
    let invite_id = state.membership.invite(&actor, club_id, &body.email, body.role).await?;
    ok(json!({ "invite_id": invite_id }))
}

/// GET /api/invites
pub async fn my_invites(State(state): State<SharedState>, CurrentUser(actor): CurrentUser) -> ActionResult<Value> {
    let invites = state.membership.my_invites(&actor).await?;
    ok(json!({ "invites": invites }))
}

/// POST /api/invites/{id}/accept
pub async fn accept_invite(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(invite_id): Path<Uuid>,
) -> ActionResult<Value> {
    let club_id = state.membership.accept_invite(&actor, invite_id).await?;
    ok(json!({ "club_id": club_id }))
}
