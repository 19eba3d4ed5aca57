//! The majors list and its platform-admin maintenance.

use std::sync::Arc;

use bobcats_common::{BobcatsError, Major, Result};
use bobcats_db::{ClubStore, DbError};
use tracing::{info, instrument};
use uuid::Uuid;

const DUPLICATE_MAJOR: &str = "A major with this name already exists";

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BobcatsError::validation("Major name is required"));
    }
    Ok(name)
}

fn major_error(e: DbError) -> BobcatsError {
    match e {
        DbError::NotFound(_) => BobcatsError::not_found("Major not found"),
        DbError::Duplicate(_) => BobcatsError::conflict(DUPLICATE_MAJOR),
        other => other.into(),
    }
}

pub struct MajorService {
    store: Arc<dyn ClubStore>,
}

impl MajorService {
    pub fn new(store: Arc<dyn ClubStore>) -> Self { Self { store } }

    /// Ordered by name.
    pub async fn list(&self) -> Result<Vec<Major>> {
        Ok(self.store.list_majors().await?)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Major> {
        let major = self.store.insert_major(required_name(name)?).await.map_err(major_error)?;
        info!(major_id = %major.id, name = %major.name, "major created");
        Ok(major)
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Major> {
        let name = required_name(name)?;
        self.store.rename_major(id, name).await.map_err(major_error)?;
        info!(major_id = %id, name, "major renamed");
        Ok(Major { id, name: name.to_string() })
    }

    /// Refused while any club lists the major.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.store.get_major(id).await?.is_none() {
            return Err(BobcatsError::not_found("Major not found"));
        }
        if self.store.major_in_use(id).await? {
            return Err(BobcatsError::validation("Cannot delete major: It is associated with clubs"));
        }
        self.store.delete_major(id).await.map_err(major_error)?;
        info!(major_id = %id, "major deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobcats_db::MemoryClubStore;

    #[tokio::test]
    async fn test_create_rename_delete() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = MajorService::new(store.clone());

        let major = svc.create("  Physics ").await.unwrap();
        assert_eq!(major.name, "Physics");
        assert_eq!(svc.create("Physics").await.unwrap_err().to_string(), DUPLICATE_MAJOR);
        assert_eq!(svc.create(" ").await.unwrap_err().to_string(), "Major name is required");

        let renamed = svc.rename(major.id, "Applied Physics").await.unwrap();
        assert_eq!(svc.list().await.unwrap(), vec![renamed]);

        svc.delete(major.id).await.unwrap();
        assert!(svc.list().await.unwrap().is_empty());
        let err = svc.delete(major.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Major not found");
        assert!(matches!(svc.rename(major.id, "x").await, Err(BobcatsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_major_used_by_a_club_cannot_be_deleted() {
        let store = Arc::new(MemoryClubStore::new());
        let svc = MajorService::new(store.clone());
        let major = svc.create("Cognitive Science").await.unwrap();
        let club_id = store.add_club("Mind Club", true).await;
        store.replace_club_majors(club_id, &[major.id]).await.unwrap();

        let err = svc.delete(major.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete major: It is associated with clubs");
        assert!(matches!(err, BobcatsError::Validation(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }
}
