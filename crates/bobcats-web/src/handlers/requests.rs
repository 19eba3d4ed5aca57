//! Club request form endpoints.

use axum::extract::{Path, State};
use axum::Json;
use bobcats_clubs::ClubRequestForm;
use bobcats_common::models::NoPayload;
use bobcats_common::ActionResponse;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ok, ActionResult};
use crate::auth::{Caller, CurrentUser};
use crate::state::SharedState;

/// POST /api/club-requests
pub async fn submit(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<ClubRequestForm>,
) -> ActionResult<Value> {
    let request_id = state.requests.submit(&actor, &form).await?;
    ok(json!({ "request_id": request_id }))
}

/// GET /api/club-requests/mine
pub async fn mine(State(state): State<SharedState>, CurrentUser(actor): CurrentUser) -> ActionResult<Value> {
    let requests = state.requests.my_requests(&actor).await?;
    ok(json!({ "requests": requests }))
}

/// GET /api/club-requests/{id}
pub async fn detail(
    State(state): State<SharedState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ActionResult<Value> {
    if caller.user.is_none() && !caller.is_admin {
        return Err(bobcats_common::BobcatsError::Unauthorized);
    }
    let detail = state.requests.detail(caller.user.as_ref(), id, caller.is_admin).await?;
    ok(json!({ "request": detail }))
}

/// PUT /api/club-requests/{id}
pub async fn update(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(form): Json<ClubRequestForm>,
) -> ActionResult<NoPayload> {
    state.requests.update(&actor, id, &form).await?;
    Ok(Json(ActionResponse::done()))
}
