//! Liveness and email worker endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use super::{ok, ActionResult};
use crate::auth::{AdminUser, CurrentUser};
use crate::state::SharedState;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/send-emails
///
/// Runs the email worker now instead of waiting for its schedule.
pub async fn send_emails(State(state): State<SharedState>, CurrentUser(actor): CurrentUser) -> ActionResult<Value> {
    info!(user = %actor.user_id, "Manual email worker trigger");
    let result = state.review.trigger_email_worker().await?;
    ok(json!({ "success": true, "message": "Email worker triggered", "result": result }))
}

/// POST /api/admin/email-worker/trigger
pub async fn admin_trigger(State(state): State<SharedState>, _admin: AdminUser) -> ActionResult<Value> {
    let result = state.review.trigger_email_worker().await?;
    ok(json!({ "success": true, "message": "Email worker triggered", "result": result }))
}
