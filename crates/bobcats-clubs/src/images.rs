//! Logo and banner uploads for club requests, and the checks shared with
//! club image uploads.

use bobcats_common::{BobcatsError, ImageKind, Result};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::requests::ClubRequestService;
use crate::Actor;

/// 2 MiB.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self) -> Result<()> {
        if !self.content_type.starts_with("image/") {
            return Err(BobcatsError::validation("File must be an image"));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(BobcatsError::validation("Image must be ≤ 2 MB"));
        }
        Ok(())
    }

    /// Club image checks, with the size message naming the slot.
    pub fn validate_for_club(&self, kind: ImageKind) -> Result<()> {
        if !self.content_type.starts_with("image/") {
            return Err(BobcatsError::validation("File must be an image"));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            let slot = match kind {
                ImageKind::Logo => "Logo",
                ImageKind::Banner => "Banner",
            };
            return Err(BobcatsError::validation(format!("{slot} file size must be ≤ 2 MB")));
        }
        Ok(())
    }

    /// Text after the last dot of the file name, or the slot's default.
    pub fn extension(&self, kind: ImageKind) -> String {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_string(),
            _ => kind.default_extension().to_string(),
        }
    }
}

pub fn storage_path(request_id: Uuid, kind: ImageKind, extension: &str) -> String {
    format!("club-requests/{}/{}.{}", request_id, kind.as_str(), extension)
}

impl ClubRequestService {
    /// Store an image and point the request at its public URL. Only the
    /// owner of a pending request may upload.
    ///
    /// Once the upload succeeds the URL is returned even if recording it on
    /// the request row fails.
    #[instrument(skip(self, upload), fields(user = %actor.user_id, kind = kind.as_str()))]
    pub async fn upload_image(
        &self,
        actor: &Actor,
        request_id: Uuid,
        kind: ImageKind,
        upload: ImageUpload,
    ) -> Result<String> {
        upload.validate()?;
        self.load_editable(actor, request_id).await?;

        let path = storage_path(request_id, kind, &upload.extension(kind));
        self.storage
            .upload(&path, upload.bytes, &upload.content_type)
            .await
            .map_err(|e| {
                error!(%request_id, error = %e, "failed to upload image");
                e
            })?;

        let url = self.storage.public_url(&path);
        if let Err(e) = self.store.set_request_image(request_id, kind, &url).await {
            error!(%request_id, error = %e, "failed to record image URL on request");
        }
        info!(%request_id, path, "request image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ClubRequestForm;
    use crate::storage::MemoryStorage;
    use bobcats_common::RequestStatus;
    use bobcats_db::{ClubStore, MemoryClubStore, RequestReview, TABLE_CLUB_REQUESTS};
    use chrono::Utc;
    use std::sync::Arc;

    fn upload(name: &str, content_type: &str, size: usize) -> ImageUpload {
        ImageUpload { file_name: name.into(), content_type: content_type.into(), bytes: vec![0; size] }
    }

    #[test]
    fn test_rejects_non_images_and_large_files() {
        assert_eq!(
            upload("notes.pdf", "application/pdf", 10).validate().unwrap_err().to_string(),
            "File must be an image"
        );
        assert_eq!(
            upload("big.png", "image/png", MAX_IMAGE_BYTES + 1).validate().unwrap_err().to_string(),
            "Image must be ≤ 2 MB"
        );
        assert!(upload("ok.png", "image/png", MAX_IMAGE_BYTES).validate().is_ok());
    }

    #[test]
    fn test_extension_defaults() {
        assert_eq!(upload("logo.webp", "image/webp", 1).extension(ImageKind::Logo), "webp");
        assert_eq!(upload("archive.tar.gz", "image/png", 1).extension(ImageKind::Logo), "gz");
        assert_eq!(upload("logo", "image/png", 1).extension(ImageKind::Logo), "png");
        assert_eq!(upload("banner.", "image/jpeg", 1).extension(ImageKind::Banner), "jpg");
    }

    async fn submitted(store: Arc<MemoryClubStore>, storage: Arc<MemoryStorage>) -> (ClubRequestService, Actor, Uuid) {
        let svc = ClubRequestService::new(store, storage);
        let owner = Actor::new(Uuid::new_v4(), "lead@ucmerced.edu");
        let form = ClubRequestForm {
            name: "Film".into(),
            description: "Movies".into(),
            contact_email: "lead@ucmerced.edu".into(),
            officer_emails: vec!["vp@ucmerced.edu".into()],
            ..Default::default()
        };
        let id = svc.submit(&owner, &form).await.unwrap();
        (svc, owner, id)
    }

    #[tokio::test]
    async fn test_upload_records_public_url() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, owner, id) = submitted(store.clone(), storage.clone()).await;

        let url = svc
            .upload_image(&owner, id, ImageKind::Banner, upload("hero.jpeg", "image/jpeg", 64))
            .await
            .unwrap();

        let path = format!("club-requests/{id}/banner.jpeg");
        assert!(url.ends_with(&path));
        assert!(storage.get(&path).await.is_some());
        let request = store.get_request(id).await.unwrap().unwrap();
        assert_eq!(request.banner_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_row_update_failure_still_returns_url() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, owner, id) = submitted(store.clone(), storage).await;
        store.fail_writes_to(TABLE_CLUB_REQUESTS).await;

        let url = svc.upload_image(&owner, id, ImageKind::Logo, upload("l.png", "image/png", 8)).await;
        assert!(url.is_ok());
        assert!(store.get_request(id).await.unwrap().unwrap().logo_url.is_none());
    }

    #[tokio::test]
    async fn test_stranger_cannot_upload() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, _, id) = submitted(store.clone(), storage.clone()).await;
        let stranger = Actor::new(Uuid::new_v4(), "someone@ucmerced.edu");

        let err = svc
            .upload_image(&stranger, id, ImageKind::Logo, upload("l.png", "image/png", 8))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You can only edit your own requests");
        assert!(matches!(err, BobcatsError::Forbidden(_)));
        assert_eq!(storage.len().await, 0);
        assert!(store.get_request(id).await.unwrap().unwrap().logo_url.is_none());
    }

    #[tokio::test]
    async fn test_reviewed_request_refuses_upload() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, owner, id) = submitted(store.clone(), storage.clone()).await;
        store
            .set_request_review(id, &RequestReview {
                status: RequestStatus::Rejected,
                admin_message: Some("No".into()),
                reviewed_by: Uuid::new_v4(),
                reviewed_at: Utc::now(),
            })
            .await
            .unwrap();

        let err = svc
            .upload_image(&owner, id, ImageKind::Banner, upload("b.jpg", "image/jpeg", 8))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only pending requests can be edited");
        assert_eq!(storage.len().await, 0);
    }

    #[tokio::test]
    async fn test_upload_to_missing_request_is_not_found() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, owner, _) = submitted(store, storage.clone()).await;

        let err = svc
            .upload_image(&owner, Uuid::new_v4(), ImageKind::Logo, upload("l.png", "image/png", 8))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Club request not found");
        assert!(matches!(err, BobcatsError::NotFound(_)));
        assert_eq!(storage.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_upload_touches_nothing() {
        let store = Arc::new(MemoryClubStore::new());
        let storage = Arc::new(MemoryStorage::default());
        let (svc, owner, id) = submitted(store, storage.clone()).await;

        let err = svc.upload_image(&owner, id, ImageKind::Logo, upload("x.txt", "text/plain", 8)).await;
        assert!(err.is_err());
        assert_eq!(storage.len().await, 0);
    }
}
