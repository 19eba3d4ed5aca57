//! Public club catalog and platform-admin club management.
//!
//! Catalog reads only ever show active clubs. Admin writes replace a club's
//! tags, majors and notes wholesale when the payload carries them; majors
//! that do not exist are dropped, and notes are kept only for kept majors.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use bobcats_common::slug::{generate_slug, unique_slug};
use bobcats_common::{BobcatsError, Club, ClubWithCounts, ImageKind, Result};
use bobcats_db::{ClubFilter, ClubStore, DbError, NewClub};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::form::{blank_to_none, distinct_ids, normalize_notes, normalize_tags};
use crate::images::ImageUpload;
use crate::storage::ObjectStorage;

pub const DEFAULT_CLUB_PAGE_SIZE: i64 = 100;

/// Catalog query string: `?major_id=&search=&limit=&offset=`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClubQuery {
    pub major_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A club card in the public catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

impl From<Club> for ClubSummary {
    fn from(c: Club) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            website: c.website,
            logo_url: c.logo_url,
            is_active: c.is_active,
        }
    }
}

/// A club with its tags, majors and per-major notes.
#[derive(Debug, Clone, Serialize)]
pub struct ClubDetail {
    #[serde(flatten)]
    pub club: Club,
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: BTreeMap<Uuid, String>,
}

/// Payload of the admin create form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClubForm {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: BTreeMap<Uuid, String>,
}

/// Admin edit payload. Absent fields are left alone; a blank optional text
/// field clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClubPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub major_ids: Option<Vec<Uuid>>,
    pub major_notes: Option<BTreeMap<Uuid, String>>,
}

/// `clubs/{slug}/logo.png` or `clubs/{slug}/banner.jpg`. Clubs without a
/// slug use their id.
pub fn club_image_path(club: &Club, kind: ImageKind) -> String {
    let folder = club.slug.clone().unwrap_or_else(|| club.id.to_string());
    format!("clubs/{}/{}.{}", folder, kind.as_str(), kind.default_extension())
}

pub struct ClubService {
    store: Arc<dyn ClubStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl ClubService {
    pub fn new(store: Arc<dyn ClubStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    async fn load(&self, club_id: Uuid) -> Result<Club> {
        self.store
            .get_club(club_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Club not found"))
    }

    async fn with_children(&self, club: Club) -> Result<ClubDetail> {
        let children = self.store.get_club_children(club.id).await?;
        Ok(ClubDetail {
            club,
            tags: children.tags,
            major_ids: children.major_ids,
            major_notes: children.major_notes,
        })
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    /// Active clubs, optionally narrowed to a major or a search term.
    pub async fn browse(&self, query: &ClubQuery) -> Result<Vec<ClubSummary>> {
        let filter = ClubFilter {
            major_id: query.major_id,
            search: query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            active_only: true,
            limit: query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_CLUB_PAGE_SIZE),
            offset: query.offset.filter(|o| *o >= 0).unwrap_or(0),
        };
        let clubs = self.store.list_clubs(&filter).await?;
        Ok(clubs.into_iter().map(ClubSummary::from).collect())
    }

    /// Inactive clubs are only visible with `include_inactive`.
    pub async fn detail(&self, club_id: Uuid, include_inactive: bool) -> Result<ClubDetail> {
        let club = self.load(club_id).await?;
        if !club.is_active && !include_inactive {
            return Err(BobcatsError::not_found("Club not found"));
        }
        self.with_children(club).await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<ClubDetail> {
        let club = self
            .store
            .get_club_by_slug(slug)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| BobcatsError::not_found("Club not found"))?;
        self.with_children(club).await
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub async fn admin_list(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<ClubWithCounts>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_CLUB_PAGE_SIZE);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        Ok(self.store.list_clubs_with_counts(limit, offset).await?)
    }

    /// Majors that exist, in request order, and the notes that belong to them.
    async fn known_majors(&self, ids: &[Uuid], notes: &BTreeMap<Uuid, String>) -> Result<(Vec<Uuid>, Vec<(Uuid, String)>)> {
        let known: HashSet<Uuid> = self.store.list_majors().await?.into_iter().map(|m| m.id).collect();
        let ids: Vec<Uuid> = distinct_ids(ids).into_iter().filter(|id| known.contains(id)).collect();
        let notes = normalize_notes(notes).into_iter().filter(|(id, _)| ids.contains(id)).collect();
        Ok((ids, notes))
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: &ClubForm) -> Result<ClubDetail> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(BobcatsError::validation("Club name is required"));
        }
        let base = form
            .slug
            .as_deref()
            .map(generate_slug)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(name));
        let base = if base.is_empty() { "club".to_string() } else { base };
        let taken = self.store.slugs_with_prefix(&base).await?;
        let slug = unique_slug(&base, |candidate| taken.iter().any(|t| t == candidate));

        let mut club = NewClub::new(name, slug.clone());
        club.description = blank_to_none(&form.description);
        club.website = blank_to_none(&form.website);
        club.logo_url = blank_to_none(&form.logo_url);
        club.banner_url = blank_to_none(&form.banner_url);
        club.is_active = form.is_active.unwrap_or(true);
        club.display_order = form.display_order.unwrap_or(0);

        let club_id = self.store.insert_club(&club).await.map_err(|e| match e {
            DbError::Duplicate(_) => BobcatsError::conflict(format!("Slug '{slug}' is already in use")),
            other => {
                error!(error = %other, "failed to create club");
                other.into()
            }
        })?;

        let (major_ids, notes) = self.known_majors(&form.major_ids, &form.major_notes).await?;
        self.store.replace_club_tags(club_id, &normalize_tags(&form.tags)).await?;
        self.store.replace_club_majors(club_id, &major_ids).await?;
        self.store.replace_club_major_notes(club_id, &notes).await?;

        info!(%club_id, %slug, "club created");
        self.detail(club_id, true).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, club_id: Uuid, patch: &ClubPatch) -> Result<ClubDetail> {
        let existing = self.load(club_id).await?;

        let name = match &patch.name {
            Some(name) if name.trim().is_empty() => return Err(BobcatsError::validation("Club name is required")),
            Some(name) => name.trim().to_string(),
            None => existing.name.clone(),
        };
        let slug = match &patch.slug {
            Some(raw) => {
                let slug = generate_slug(raw);
                if slug.is_empty() {
                    return Err(BobcatsError::validation("Slug must contain letters or numbers"));
                }
                slug
            }
            None => existing.slug.clone().unwrap_or_else(|| generate_slug(&existing.name)),
        };
        let replace = |patched: &Option<String>, current: &Option<String>| match patched {
            Some(_) => blank_to_none(patched),
            None => current.clone(),
        };

        let club = NewClub {
            name,
            slug: slug.clone(),
            description: replace(&patch.description, &existing.description),
            website: replace(&patch.website, &existing.website),
            logo_url: replace(&patch.logo_url, &existing.logo_url),
            banner_url: replace(&patch.banner_url, &existing.banner_url),
            is_active: patch.is_active.unwrap_or(existing.is_active),
            display_order: patch.display_order.unwrap_or(existing.display_order),
        };
        self.store.update_club(club_id, &club).await.map_err(|e| match e {
            DbError::Duplicate(_) => BobcatsError::conflict(format!("Slug '{slug}' is already in use")),
            DbError::NotFound(_) => BobcatsError::not_found("Club not found"),
            other => other.into(),
        })?;

        if let Some(tags) = &patch.tags {
            self.store.replace_club_tags(club_id, &normalize_tags(tags)).await?;
        }
        if patch.major_ids.is_some() || patch.major_notes.is_some() {
            let current = self.store.get_club_children(club_id).await?;
            let ids = patch.major_ids.clone().unwrap_or(current.major_ids);
            let notes = patch.major_notes.clone().unwrap_or(current.major_notes);
            let (major_ids, notes) = self.known_majors(&ids, &notes).await?;
            self.store.replace_club_majors(club_id, &major_ids).await?;
            self.store.replace_club_major_notes(club_id, &notes).await?;
        }

        info!(%club_id, "club updated");
        self.detail(club_id, true).await
    }

    /// Delete the club with everything hanging off it. Stored images are
    /// removed afterwards; a storage failure is only logged.
    #[instrument(skip(self))]
    pub async fn delete(&self, club_id: Uuid) -> Result<()> {
        let club = self.load(club_id).await?;
        self.store.delete_club(club_id).await.map_err(|e| match e {
            DbError::NotFound(_) => BobcatsError::not_found("Club not found"),
            other => other.into(),
        })?;

        let paths = [ImageKind::Logo, ImageKind::Banner].map(|kind| club_image_path(&club, kind));
        if let Err(e) = self.storage.remove(&paths).await {
            warn!(%club_id, error = %e, "failed to remove club images");
        }
        info!(%club_id, "club deleted");
        Ok(())
    }

    /// Replace the club's logo or banner and point the club at its public URL.
    #[instrument(skip(self, upload), fields(kind = kind.as_str()))]
    pub async fn upload_image(&self, club_id: Uuid, kind: ImageKind, upload: ImageUpload) -> Result<String> {
        upload.validate_for_club(kind)?;
        let club = self.load(club_id).await?;

        let path = club_image_path(&club, kind);
        self.storage.upload(&path, upload.bytes, &upload.content_type).await.map_err(|e| {
            error!(%club_id, error = %e, "failed to upload club image");
            e
        })?;

        let url = self.storage.public_url(&path);
        self.store.set_club_image(club_id, kind, &url).await?;
        info!(%club_id, path, "club image uploaded");
        Ok(url)
    }
}
