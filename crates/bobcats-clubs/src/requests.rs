//! Club request submission, editing and queries.
//!
//! The parent row write decides success. Tag, major and note rows are written
//! afterwards one statement at a time; their failures are logged and the
//! request stays created.

use std::sync::Arc;

use bobcats_common::{BobcatsError, ClubRequest, Result};
use bobcats_db::{ClubStore, NewClubRequest, RequestUpdate};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::form::{ClubRequestForm, ValidatedForm};
use crate::storage::ObjectStorage;
use crate::Actor;

/// A request with its child rows, as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ClubRequestDetail {
    #[serde(flatten)]
    pub request: ClubRequest,
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: std::collections::BTreeMap<Uuid, String>,
}

pub struct ClubRequestService {
    pub(crate) store: Arc<dyn ClubStore>,
    pub(crate) storage: Arc<dyn ObjectStorage>,
}

impl ClubRequestService {
    pub fn new(store: Arc<dyn ClubStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    /// Create a pending request owned by `actor`.
    #[instrument(skip(self, form), fields(user = %actor.user_id))]
    pub async fn submit(&self, actor: &Actor, form: &ClubRequestForm) -> Result<Uuid> {
        let form = form.validate()?;

        let request_id = self
            .store
            .insert_request(&NewClubRequest {
                name: form.name.clone(),
                description: form.description.clone(),
                website: form.website.clone(),
                slug_candidate: form.slug_candidate.clone(),
                contact_email: form.emails.contact_email.clone(),
                officer_emails: form.emails.officer_emails.clone(),
                officer_phones: form.officer_phones.clone(),
                logo_url: form.logo_url.clone(),
                banner_url: form.banner_url.clone(),
                submitted_by: actor.user_id,
            })
            .await
            .map_err(|e| {
                error!(error = %e, "failed to create club request");
                BobcatsError::from(e)
            })?;

        self.insert_children(request_id, &form).await;
        info!(%request_id, name = %form.name, "club request submitted");
        Ok(request_id)
    }

    /// Rewrite a pending request owned by `actor`. Image URLs are left alone.
    #[instrument(skip(self, form), fields(user = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, request_id: Uuid, form: &ClubRequestForm) -> Result<()> {
        let form = form.validate()?;
        self.load_editable(actor, request_id).await?;

        self.store
            .update_request(request_id, &RequestUpdate {
                name: form.name.clone(),
                description: form.description.clone(),
                website: form.website.clone(),
                slug_candidate: form.slug_candidate.clone(),
                contact_email: form.emails.contact_email.clone(),
                officer_emails: form.emails.officer_emails.clone(),
                officer_phones: form.officer_phones.clone(),
                updated_at: Utc::now(),
            })
            .await
            .map_err(|e| {
                error!(%request_id, error = %e, "failed to update club request");
                BobcatsError::from(e)
            })?;

        if let Err(e) = self.store.delete_request_tags(request_id).await {
            warn!(%request_id, error = %e, "failed to clear request tags");
        }
        if let Err(e) = self.store.delete_request_majors(request_id).await {
            warn!(%request_id, error = %e, "failed to clear request majors");
        }
        if let Err(e) = self.store.delete_request_major_notes(request_id).await {
            warn!(%request_id, error = %e, "failed to clear request major notes");
        }
        self.insert_children(request_id, &form).await;

        info!(%request_id, "club request updated");
        Ok(())
    }

    /// The request, if it is pending and owned by `actor`.
    pub(crate) async fn load_editable(&self, actor: &Actor, request_id: Uuid) -> Result<ClubRequest> {
        let existing = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Club request not found"))?;
        if !existing.is_pending() {
            return Err(BobcatsError::validation("Only pending requests can be edited"));
        }
        if existing.submitted_by != Some(actor.user_id) {
            return Err(BobcatsError::forbidden("You can only edit your own requests"));
        }
        Ok(existing)
    }

    async fn insert_children(&self, request_id: Uuid, form: &ValidatedForm) {
        if let Err(e) = self.store.insert_request_tags(request_id, &form.tags).await {
            error!(%request_id, error = %e, "failed to insert request tags");
        }
        if let Err(e) = self.store.insert_request_majors(request_id, &form.major_ids).await {
            error!(%request_id, error = %e, "failed to insert request majors");
        }
        if let Err(e) = self.store.insert_request_major_notes(request_id, &form.major_notes).await {
            error!(%request_id, error = %e, "failed to insert request major notes");
        }
    }

    pub async fn my_requests(&self, actor: &Actor) -> Result<Vec<ClubRequest>> {
        Ok(self.store.list_requests_by_submitter(actor.user_id).await?)
    }

    /// Visible to the submitter, or to a platform admin when `as_admin` is set.
    pub async fn detail(&self, actor: Option<&Actor>, request_id: Uuid, as_admin: bool) -> Result<ClubRequestDetail> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Club request not found"))?;

        let owner = actor.is_some_and(|a| request.submitted_by == Some(a.user_id));
        if !owner && !as_admin {
            return Err(BobcatsError::forbidden("You can only view your own requests"));
        }

        let children = self.store.get_request_children(request_id).await?;
        Ok(ClubRequestDetail {
            request,
            tags: children.tags,
            major_ids: children.major_ids,
            major_notes: children.major_notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use bobcats_common::RequestStatus;
    use bobcats_db::{MemoryClubStore, RequestReview, TABLE_CLUB_REQUEST_MAJORS, TABLE_CLUB_REQUEST_TAGS};
    use std::collections::BTreeMap;

    fn service(store: Arc<MemoryClubStore>) -> ClubRequestService {
        ClubRequestService::new(store, Arc::new(MemoryStorage::default()))
    }

    fn actor() -> Actor { Actor::new(Uuid::new_v4(), "owner@ucmerced.edu") }

    fn form(major: Uuid) -> ClubRequestForm {
        ClubRequestForm {
            name: "Robotics".into(),
            description: "Build robots".into(),
            contact_email: "owner@ucmerced.edu".into(),
            officer_emails: vec!["VP@ucmerced.edu".into(), "owner@ucmerced.edu".into()],
            tags: vec!["STEM".into()],
            major_ids: vec![major],
            major_notes: BTreeMap::from([(major, "Core audience".to_string())]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_request_with_children() {
        let store = Arc::new(MemoryClubStore::new());
        let major = store.add_major("Computer Science").await;
        let svc = service(store.clone());
        let owner = actor();

        let id = svc.submit(&owner, &form(major)).await.unwrap();
        let detail = svc.detail(Some(&owner), id, false).await.unwrap();

        assert_eq!(detail.request.status, RequestStatus::Pending);
        assert_eq!(detail.request.officer_emails, vec!["vp@ucmerced.edu"]);
        assert_eq!(detail.request.submitted_by, Some(owner.user_id));
        assert_eq!(detail.tags, vec!["stem"]);
        assert_eq!(detail.major_ids, vec![major]);
        assert_eq!(detail.major_notes.get(&major).map(String::as_str), Some("Core audience"));
    }

    #[tokio::test]
    async fn test_child_failure_keeps_request() {
        let store = Arc::new(MemoryClubStore::new());
        store.fail_writes_to(TABLE_CLUB_REQUEST_TAGS).await;
        store.fail_writes_to(TABLE_CLUB_REQUEST_MAJORS).await;
        let svc = service(store.clone());
        let owner = actor();

        let id = svc.submit(&owner, &form(Uuid::new_v4())).await.unwrap();
        let detail = svc.detail(Some(&owner), id, false).await.unwrap();
        assert!(detail.tags.is_empty());
        assert!(detail.major_ids.is_empty());
        assert_eq!(detail.major_notes.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_write() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = service(store.clone());
        let mut bad = form(Uuid::new_v4());
        bad.officer_emails = vec!["owner@ucmerced.edu".into()];

        assert!(svc.submit(&actor(), &bad).await.is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_children() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = service(store.clone());
        let owner = actor();
        let major = Uuid::new_v4();
        let id = svc.submit(&owner, &form(major)).await.unwrap();

        let mut edit = form(major);
        edit.name = "Robotics Society".into();
        edit.tags = vec!["engineering".into()];
        edit.major_ids = vec![];
        edit.major_notes = BTreeMap::new();
        svc.update(&owner, id, &edit).await.unwrap();

        let detail = svc.detail(Some(&owner), id, false).await.unwrap();
        assert_eq!(detail.request.name, "Robotics Society");
        assert_eq!(detail.tags, vec!["engineering"]);
        assert!(detail.major_ids.is_empty());
        assert!(detail.major_notes.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = service(store.clone());
        let id = svc.submit(&actor(), &form(Uuid::new_v4())).await.unwrap();

        let err = svc.update(&actor(), id, &form(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.to_string(), "You can only edit your own requests");
    }

    #[tokio::test]
    async fn test_update_requires_pending() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = service(store.clone());
        let owner = actor();
        let id = svc.submit(&owner, &form(Uuid::new_v4())).await.unwrap();
        store
            .set_request_review(id, &RequestReview {
                status: RequestStatus::Approved,
                admin_message: None,
                reviewed_by: Uuid::new_v4(),
                reviewed_at: Utc::now(),
            })
            .await
            .unwrap();

        let err = svc.update(&owner, id, &form(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.to_string(), "Only pending requests can be edited");
    }

    #[tokio::test]
    async fn test_update_missing_request() {
        let svc = service(Arc::new(MemoryClubStore::new()));
        let err = svc.update(&actor(), Uuid::new_v4(), &form(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.to_string(), "Club request not found");
    }

    #[tokio::test]
    async fn test_detail_hidden_from_other_users() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = service(store);
        let id = svc.submit(&actor(), &form(Uuid::new_v4())).await.unwrap();

        assert!(matches!(svc.detail(Some(&actor()), id, false).await, Err(BobcatsError::Forbidden(_))));
        assert!(svc.detail(None, id, true).await.is_ok());
    }
}
