//! Platform-admin review and maintenance endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use bobcats_clubs::{ApprovalOutcome, CleanupOutcome};
use bobcats_common::models::NoPayload;
use bobcats_common::{ActionResponse, RequestStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ok, optional_json, ActionResult};
use crate::auth::AdminUser;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<RequestStatus>,
}

/// GET /api/admin/club-requests?status=pending
pub async fn list_requests(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> ActionResult<Value> {
    let requests = state.review.list(query.status).await?;
    ok(json!({ "requests": requests }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApproveBody {
    pub slug_override: Option<String>,
}

/// POST /api/admin/club-requests/{id}/approve
///
/// The body is optional; `slug_override` replaces the requested slug.
pub async fn approve(
    State(state): State<SharedState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ActionResult<ApprovalOutcome> {
    let body: ApproveBody = optional_json(&body)?;
    let outcome = state.review.approve(admin.reviewer, id, body.slug_override.as_deref()).await?;
    ok(outcome)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectBody {
    pub admin_message: String,
}

/// POST /api/admin/club-requests/{id}/reject
pub async fn reject(
    State(state): State<SharedState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectBody>,
) -> ActionResult<NoPayload> {
    state.review.reject(admin.reviewer, id, &body.admin_message).await?;
    Ok(Json(ActionResponse::done()))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CleanupBody {
    pub older_than_days: i64,
    pub dry_run: bool,
}

impl Default for CleanupBody {
    fn default() -> Self { Self { older_than_days: 0, dry_run: true } }
}

/// POST /api/admin/maintenance/cleanup-rejected
///
/// Defaults to a dry run; send `"dry_run": false` to delete.
pub async fn cleanup_rejected(
    State(state): State<SharedState>,
    _admin: AdminUser,
    body: Bytes,
) -> ActionResult<CleanupOutcome> {
    let body: CleanupBody = optional_json(&body)?;
    let outcome = state.review.cleanup_rejected(body.older_than_days, body.dry_run).await?;
    ok(outcome)
}
