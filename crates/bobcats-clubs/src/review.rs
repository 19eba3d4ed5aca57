//! Platform-admin review of club requests and request housekeeping.

use std::sync::Arc;

use bobcats_common::slug::{generate_slug, unique_slug};
use bobcats_common::{BobcatsError, ClubRequest, MemberRole, RequestStatus, Result};
use bobcats_db::{ApprovalPlan, ClubStore, DbError, NewClub, RequestReview};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::notify::{fire_and_forget, EmailTrigger};

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub club_id: Uuid,
    pub slug: String,
    pub invites_created: usize,
}

/// `would_delete_count` for a dry run, `deleted_count` otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupOutcome {
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_delete_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}

pub struct ReviewService {
    store: Arc<dyn ClubStore>,
    trigger: Arc<dyn EmailTrigger>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ClubStore>, trigger: Arc<dyn EmailTrigger>) -> Self {
        Self { store, trigger }
    }

    pub async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<ClubRequest>> {
        Ok(self.store.list_requests(status).await?)
    }

    async fn load_pending(&self, request_id: Uuid) -> Result<ClubRequest> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Club request not found"))?;
        if !request.is_pending() {
            return Err(BobcatsError::validation("Only pending requests can be reviewed"));
        }
        Ok(request)
    }

    /// Unique slug from the override, else the request's candidate, else its
    /// name, else `club`.
    async fn pick_slug(&self, request: &ClubRequest, slug_override: Option<&str>) -> Result<String> {
        let base = [slug_override, request.slug_candidate.as_deref(), Some(request.name.as_str())]
            .into_iter()
            .flatten()
            .map(generate_slug)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| "club".to_string());
        let taken = self.store.slugs_with_prefix(&base).await?;
        Ok(unique_slug(&base, |candidate| taken.iter().any(|t| t == candidate)))
    }

    /// Create the club with the request's tags and majors, invite its contact
    /// as admin and its officers as officers, and mark the request approved.
    /// All of it is written in one transaction.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        reviewer: Uuid,
        request_id: Uuid,
        slug_override: Option<&str>,
    ) -> Result<ApprovalOutcome> {
        let request = self.load_pending(request_id).await?;
        let slug = self.pick_slug(&request, slug_override).await?;

        let mut invites: Vec<(String, MemberRole)> = vec![(request.contact_email.clone(), MemberRole::Admin)];
        for email in &request.officer_emails {
            if !invites.iter().any(|(e, _)| e == email) {
                invites.push((email.clone(), MemberRole::Officer));
            }
        }
        let invites_created = invites.len();

        let mut club = NewClub::new(request.name.clone(), slug.clone());
        club.description = Some(request.description.clone());
        club.website = request.website.clone();
        club.logo_url = request.logo_url.clone();
        club.banner_url = request.banner_url.clone();

        let plan = ApprovalPlan { request_id, club, invites, reviewed_by: reviewer, reviewed_at: Utc::now() };
        let club_id = self.store.approve_request(&plan).await.map_err(|e| match e {
            DbError::NotFound(_) => BobcatsError::validation("Only pending requests can be reviewed"),
            DbError::Duplicate(_) => BobcatsError::conflict(format!("Slug '{slug}' is already in use")),
            other => {
                error!(%request_id, error = %other, "failed to approve club request");
                other.into()
            }
        })?;

        info!(%request_id, %club_id, %slug, invites_created, "club request approved");
        fire_and_forget(self.trigger.clone(), "club request approved");
        Ok(ApprovalOutcome { club_id, slug, invites_created })
    }

    #[instrument(skip(self, message))]
    pub async fn reject(&self, reviewer: Uuid, request_id: Uuid, message: &str) -> Result<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(BobcatsError::validation("Admin message is required for rejection"));
        }
        self.load_pending(request_id).await?;

        self.store
            .set_request_review(request_id, &RequestReview {
                status: RequestStatus::Rejected,
                admin_message: Some(message.to_string()),
                reviewed_by: reviewer,
                reviewed_at: Utc::now(),
            })
            .await?;

        info!(%request_id, "club request rejected");
        fire_and_forget(self.trigger.clone(), "club request rejected");
        Ok(())
    }

    /// Delete rejected requests reviewed at least `older_than_days` ago.
    pub async fn cleanup_rejected(&self, older_than_days: i64, dry_run: bool) -> Result<CleanupOutcome> {
        if older_than_days < 0 {
            return Err(BobcatsError::validation("older_than_days must not be negative"));
        }
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let count = self.store.delete_rejected_requests(cutoff, dry_run).await?;

        if dry_run {
            info!(count, older_than_days, "rejected request cleanup preview");
            Ok(CleanupOutcome { dry_run, would_delete_count: Some(count), deleted_count: None })
        } else {
            warn!(count, older_than_days, "deleted rejected club requests");
            Ok(CleanupOutcome { dry_run, would_delete_count: None, deleted_count: Some(count) })
        }
    }

    /// Run the email worker now and wait for its reply.
    pub async fn trigger_email_worker(&self) -> Result<Value> {
        self.trigger.trigger().await
    }
}
