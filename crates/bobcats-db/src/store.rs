//! The storage seam used by the club services.

use async_trait::async_trait;
use bobcats_common::{
    Club, ClubChildren, ClubInvite, ClubMember, ClubMembership, ClubRequest, ClubWithCounts,
    ImageKind, Major, MemberRole, RequestChildren, RequestStatus,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// Columns written by a new submission. Status is always `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClubRequest {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub slug_candidate: Option<String>,
    pub contact_email: String,
    pub officer_emails: Vec<String>,
    pub officer_phones: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub submitted_by: Uuid,
}

/// Columns an owner may rewrite while the request is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestUpdate {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub slug_candidate: Option<String>,
    pub contact_email: String,
    pub officer_emails: Vec<String>,
    pub officer_phones: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestReview {
    pub status: RequestStatus,
    pub admin_message: Option<String>,
    pub reviewed_by: Uuid,
    pub reviewed_at: DateTime<Utc>,
}

/// Every column of a club row except its id and creation time. Used both to
/// insert and to rewrite a club.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClub {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

impl NewClub {
    /// An active club with display order 0 and no optional fields.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: None,
            website: None,
            logo_url: None,
            banner_url: None,
            is_active: true,
            display_order: 0,
        }
    }
}

/// Public catalog query. `search` matches name or description, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubFilter {
    pub major_id: Option<Uuid>,
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Everything an approval writes. Applied all-or-nothing by
/// [`ClubStore::approve_request`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalPlan {
    pub request_id: Uuid,
    pub club: NewClub,
    /// Email and role, already normalized and distinct.
    pub invites: Vec<(String, MemberRole)>,
    pub reviewed_by: Uuid,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMembership {
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvite {
    pub club_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub created_by: Option<Uuid>,
}

/// Every statement the services issue. Each method is a single statement
/// unless its docs say otherwise; callers decide which failures are fatal.
#[async_trait]
pub trait ClubStore: Send + Sync {
    // ── Club requests ────────────────────────────────────────────────────────

    async fn insert_request(&self, request: &NewClubRequest) -> Result<Uuid>;

    async fn get_request(&self, id: Uuid) -> Result<Option<ClubRequest>>;

    /// Fails with `NotFound` when no row matched.
    async fn update_request(&self, id: Uuid, update: &RequestUpdate) -> Result<()>;

    async fn set_request_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()>;

    /// Newest first.
    async fn list_requests_by_submitter(&self, user_id: Uuid) -> Result<Vec<ClubRequest>>;

    /// Newest first, optionally filtered by status.
    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<ClubRequest>>;

    async fn set_request_review(&self, id: Uuid, review: &RequestReview) -> Result<()>;

    /// In one transaction: create the club, copy the request's tags, majors
    /// and notes onto it, create the invites and mark the request approved.
    /// Fails with `NotFound` if the request is no longer pending, and with
    /// `Duplicate` if the slug is taken. On failure nothing is written.
    async fn approve_request(&self, plan: &ApprovalPlan) -> Result<Uuid>;

    /// Rejected requests last touched before `cutoff`. With `dry_run` nothing
    /// is deleted and the count of matching rows is returned.
    async fn delete_rejected_requests(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<u64>;

    // ── Request child rows ───────────────────────────────────────────────────

    async fn insert_request_tags(&self, request_id: Uuid, tags: &[String]) -> Result<()>;

    async fn delete_request_tags(&self, request_id: Uuid) -> Result<()>;

    async fn insert_request_majors(&self, request_id: Uuid, major_ids: &[Uuid]) -> Result<()>;

    async fn delete_request_majors(&self, request_id: Uuid) -> Result<()>;

    async fn insert_request_major_notes(&self, request_id: Uuid, notes: &[(Uuid, String)]) -> Result<()>;

    async fn delete_request_major_notes(&self, request_id: Uuid) -> Result<()>;

    async fn get_request_children(&self, request_id: Uuid) -> Result<RequestChildren>;

    // ── Majors ───────────────────────────────────────────────────────────────

    /// Ordered by name.
    async fn list_majors(&self) -> Result<Vec<Major>>;

    async fn get_major(&self, id: Uuid) -> Result<Option<Major>>;

    /// Fails with `Duplicate` if the name is taken.
    async fn insert_major(&self, name: &str) -> Result<Major>;

    /// Fails with `NotFound` or `Duplicate`.
    async fn rename_major(&self, id: Uuid, name: &str) -> Result<()>;

    /// Fails with `NotFound` when no row matched.
    async fn delete_major(&self, id: Uuid) -> Result<()>;

    /// Whether any club lists this major.
    async fn major_in_use(&self, id: Uuid) -> Result<bool>;

    // ── Clubs ────────────────────────────────────────────────────────────────

    async fn get_club(&self, id: Uuid) -> Result<Option<Club>>;

    async fn get_club_by_slug(&self, slug: &str) -> Result<Option<Club>>;

    /// Ordered by display order, then creation time.
    async fn list_clubs(&self, filter: &ClubFilter) -> Result<Vec<Club>>;

    /// Every club with member and pending-invite counts, same order as
    /// [`ClubStore::list_clubs`].
    async fn list_clubs_with_counts(&self, limit: i64, offset: i64) -> Result<Vec<ClubWithCounts>>;

    /// `base` itself and every `base-N` slug already in use.
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>>;

    /// Fails with `Duplicate` if the slug is taken.
    async fn insert_club(&self, club: &NewClub) -> Result<Uuid>;

    /// Rewrite every column. Fails with `NotFound` or `Duplicate`.
    async fn update_club(&self, id: Uuid, club: &NewClub) -> Result<()>;

    async fn set_club_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()>;

    /// Removes the club with its child rows, memberships and invites.
    async fn delete_club(&self, id: Uuid) -> Result<()>;

    async fn get_club_children(&self, club_id: Uuid) -> Result<ClubChildren>;

    /// Delete-then-insert, each in its own transaction.
    async fn replace_club_tags(&self, club_id: Uuid, tags: &[String]) -> Result<()>;

    async fn replace_club_majors(&self, club_id: Uuid, major_ids: &[Uuid]) -> Result<()>;

    async fn replace_club_major_notes(&self, club_id: Uuid, notes: &[(Uuid, String)]) -> Result<()>;

    // ── Memberships ──────────────────────────────────────────────────────────

    async fn get_membership(&self, club_id: Uuid, user_id: Uuid) -> Result<Option<ClubMembership>>;

    /// One page of members (oldest first) and the total member count.
    async fn list_members(&self, club_id: Uuid, limit: i64, offset: i64) -> Result<(Vec<ClubMember>, i64)>;

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Uuid>;

    async fn set_member_role(&self, club_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<()>;

    async fn remove_member(&self, club_id: Uuid, user_id: Uuid) -> Result<()>;

    // ── Invites ──────────────────────────────────────────────────────────────

    async fn find_pending_invite(&self, club_id: Uuid, email: &str) -> Result<Option<ClubInvite>>;

    /// Fails with `Duplicate` if an unaccepted invite for (club, email) exists.
    async fn insert_invite(&self, invite: &NewInvite) -> Result<Uuid>;

    /// Unaccepted invites of a club, newest first.
    async fn list_pending_invites(&self, club_id: Uuid) -> Result<Vec<ClubInvite>>;

    /// Unaccepted invites addressed to `email`, newest first.
    async fn list_pending_invites_for_email(&self, email: &str) -> Result<Vec<ClubInvite>>;

    async fn get_invite(&self, id: Uuid) -> Result<Option<ClubInvite>>;

    async fn mark_invite_accepted(&self, id: Uuid, accepted_at: DateTime<Utc>) -> Result<()>;
}
