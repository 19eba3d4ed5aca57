//! Domain records shared by the store, the services and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BobcatsError;

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Review state of a club request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = BobcatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(BobcatsError::validation(format!("Unknown request status: {other}"))),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Role a user holds inside a club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Officer,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Officer => "officer",
            MemberRole::Member => "member",
        }
    }
}

impl Default for MemberRole {
    fn default() -> Self { MemberRole::Member }
}

impl FromStr for MemberRole {
    type Err = BobcatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "officer" => Ok(MemberRole::Officer),
            "member" => Ok(MemberRole::Member),
            other => Err(BobcatsError::validation(format!("Unknown member role: {other}"))),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Which request image slot an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Logo,
    Banner,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Logo => "logo",
            ImageKind::Banner => "banner",
        }
    }

    /// Extension used when the uploaded file name carries none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            ImageKind::Logo => "png",
            ImageKind::Banner => "jpg",
        }
    }
}

impl FromStr for ImageKind {
    type Err = BobcatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logo" => Ok(ImageKind::Logo),
            "banner" => Ok(ImageKind::Banner),
            other => Err(BobcatsError::validation(format!("Unknown image type: {other}"))),
        }
    }
}

// ── Club requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubRequest {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub slug_candidate: Option<String>,
    pub contact_email: String,
    pub officer_emails: Vec<String>,
    pub officer_phones: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub status: RequestStatus,
    pub admin_message: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClubRequest {
    pub fn is_pending(&self) -> bool { self.status == RequestStatus::Pending }
}

/// Rows of the three child tables hanging off a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestChildren {
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: BTreeMap<Uuid, String>,
}

/// Tags, majors and per-major notes of a club. Same shape as a request's.
pub type ClubChildren = RequestChildren;

// ── Clubs, majors, memberships ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A club as listed on the platform-admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubWithCounts {
    #[serde(flatten)]
    pub club: Club,
    pub member_count: i64,
    pub pending_invite_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubMembership {
    pub id: Uuid,
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// Row of the members table as shown to club admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubMember {
    pub user_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

impl From<ClubMembership> for ClubMember {
    fn from(m: ClubMembership) -> Self {
        Self { user_id: m.user_id, email: m.email, role: m.role, created_at: m.created_at }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubInvite {
    pub id: Uuid,
    pub club_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl ClubInvite {
    pub fn is_pending(&self) -> bool { self.accepted_at.is_none() }
}

// ── Action envelope ───────────────────────────────────────────────────────────

/// Placeholder payload for actions that only report success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoPayload {}

/// `{ ok, ...payload }` or `{ ok: false, error }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ActionResponse<NoPayload> {
    pub fn done() -> Self {
        Self { ok: true, data: None, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Created { request_id: Uuid }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [RequestStatus::Pending, RequestStatus::Approved, RequestStatus::Rejected] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("archived".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_image_kind_default_extensions() {
        assert_eq!(ImageKind::Logo.default_extension(), "png");
        assert_eq!(ImageKind::Banner.default_extension(), "jpg");
        assert_eq!("banner".parse::<ImageKind>().unwrap(), ImageKind::Banner);
    }

    #[test]
    fn test_action_response_shapes() {
        let id = Uuid::new_v4();
        let ok = serde_json::to_value(ActionResponse::success(Created { request_id: id })).unwrap();
        assert_eq!(ok["ok"], true);
        assert_eq!(ok["request_id"], id.to_string());
        assert!(ok.get("error").is_none());

        let failed = serde_json::to_value(ActionResponse::failure("Club name is required")).unwrap();
        assert_eq!(failed, serde_json::json!({ "ok": false, "error": "Club name is required" }));

        let done = serde_json::to_value(ActionResponse::done()).unwrap();
        assert_eq!(done, serde_json::json!({ "ok": true }));
    }
}
