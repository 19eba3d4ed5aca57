//! In-process [`ClubStore`] used for local development and service tests.
//!
//! Mirrors the Postgres constraints the services rely on: unique slugs and
//! major names, the pending-invite uniqueness index, `NotFound` on updates
//! that match no row, and all-or-nothing approval. Writes to a table can be
//! made to fail with [`MemoryClubStore::fail_writes_to`].

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bobcats_common::{
    Club, ClubChildren, ClubInvite, ClubMember, ClubMembership, ClubRequest, ClubWithCounts,
    ImageKind, Major, MemberRole, RequestChildren, RequestStatus,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::schema;
use crate::store::{
    ApprovalPlan, ClubFilter, ClubStore, NewClub, NewClubRequest, NewInvite, NewMembership,
    RequestReview, RequestUpdate,
};

#[derive(Default)]
struct Tables {
    majors: Vec<Major>,
    clubs: Vec<Club>,
    requests: Vec<ClubRequest>,
    tags: Vec<(Uuid, String)>,
    request_majors: Vec<(Uuid, Uuid)>,
    major_notes: Vec<(Uuid, Uuid, String)>,
    club_tags: Vec<(Uuid, String)>,
    club_majors: Vec<(Uuid, Uuid)>,
    club_major_notes: Vec<(Uuid, Uuid, String)>,
    memberships: Vec<ClubMembership>,
    invites: Vec<ClubInvite>,
}

impl Tables {
    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.clubs
            .iter()
            .any(|c| c.slug.as_deref() == Some(slug) && Some(c.id) != except)
    }

    fn club_children(&self, club_id: Uuid) -> ClubChildren {
        let mut tags: Vec<String> = self
            .club_tags
            .iter()
            .filter(|(id, _)| *id == club_id)
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort();
        ClubChildren {
            tags,
            major_ids: self.club_majors.iter().filter(|(id, _)| *id == club_id).map(|(_, m)| *m).collect(),
            major_notes: self
                .club_major_notes
                .iter()
                .filter(|(id, _, _)| *id == club_id)
                .map(|(_, m, n)| (*m, n.clone()))
                .collect(),
        }
    }
}

fn club_row(id: Uuid, club: &NewClub, created_at: DateTime<Utc>) -> Club {
    Club {
        id,
        name: club.name.clone(),
        slug: Some(club.slug.clone()),
        description: club.description.clone(),
        website: club.website.clone(),
        logo_url: club.logo_url.clone(),
        banner_url: club.banner_url.clone(),
        is_active: club.is_active,
        display_order: club.display_order,
        created_at,
    }
}

#[derive(Default)]
pub struct MemoryClubStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<&'static str>>,
    writes: AtomicU64,
    hide_pending_invites: AtomicBool,
}

impl MemoryClubStore {
    pub fn new() -> Self { Self::default() }

    /// A store pre-populated with the given majors.
    pub fn with_majors<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let majors = names
            .into_iter()
            .map(|name| Major { id: Uuid::new_v4(), name: name.into() })
            .collect();
        Self { tables: Mutex::new(Tables { majors, ..Tables::default() }), ..Self::default() }
    }

    /// Make every later write to `table` fail.
    pub async fn fail_writes_to(&self, table: &'static str) {
        self.failing.lock().await.insert(table);
    }

    pub async fn allow_writes_to(&self, table: &'static str) {
        self.failing.lock().await.remove(table);
    }

    /// Make `find_pending_invite` report nothing, as if a concurrent writer
    /// had not committed yet. The uniqueness check on insert still applies.
    pub async fn hide_pending_invites(&self, hide: bool) {
        self.hide_pending_invites.store(hide, Ordering::SeqCst);
    }

    /// Number of successful write statements so far.
    pub fn write_count(&self) -> u64 { self.writes.load(Ordering::SeqCst) }

    pub async fn add_major(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().await.majors.push(Major { id, name: name.to_string() });
        id
    }

    /// Insert a club directly, bypassing the approval flow.
    pub async fn add_club(&self, name: &str, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        let mut club = club_row(id, &NewClub::new(name, ""), Utc::now());
        club.slug = None;
        club.is_active = is_active;
        self.tables.lock().await.clubs.push(club);
        id
    }

    /// Overwrite timestamps of a request, for age-based cleanup tests.
    pub async fn backdate_request(&self, id: Uuid, at: DateTime<Utc>) {
        let mut tables = self.tables.lock().await;
        if let Some(r) = tables.requests.iter_mut().find(|r| r.id == id) {
            r.created_at = at;
            r.updated_at = at;
            if r.reviewed_at.is_some() {
                r.reviewed_at = Some(at);
            }
        }
    }

    pub async fn clubs(&self) -> Vec<Club> { self.tables.lock().await.clubs.clone() }

    pub async fn invites(&self) -> Vec<ClubInvite> { self.tables.lock().await.invites.clone() }

    pub async fn club_children(&self, club_id: Uuid) -> ClubChildren {
        self.tables.lock().await.club_children(club_id)
    }

    async fn check_write(&self, table: &'static str) -> Result<()> {
        self.check_writes(&[table]).await
    }

    /// Fails if any of `tables` is failing; counts one write per table otherwise.
    async fn check_writes(&self, tables: &[&'static str]) -> Result<()> {
        let failing = self.failing.lock().await;
        if let Some(table) = tables.iter().find(|t| failing.contains(*t)) {
            return Err(DbError::WriteFailed(format!("writes to {table} are disabled")));
        }
        self.writes.fetch_add(tables.len() as u64, Ordering::SeqCst);
        Ok(())
    }
}

fn newest_first(mut rows: Vec<ClubRequest>) -> Vec<ClubRequest> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[async_trait]
impl ClubStore for MemoryClubStore {
    async fn insert_request(&self, request: &NewClubRequest) -> Result<Uuid> {
        self.check_write(schema::TABLE_CLUB_REQUESTS).await?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.tables.lock().await.requests.push(ClubRequest {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            website: request.website.clone(),
            slug_candidate: request.slug_candidate.clone(),
            contact_email: request.contact_email.clone(),
            officer_emails: request.officer_emails.clone(),
            officer_phones: request.officer_phones.clone(),
            logo_url: request.logo_url.clone(),
            banner_url: request.banner_url.clone(),
            status: RequestStatus::Pending,
            admin_message: None,
            reviewed_at: None,
            reviewed_by: None,
            submitted_by: Some(request.submitted_by),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<ClubRequest>> {
        Ok(self.tables.lock().await.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn update_request(&self, id: Uuid, update: &RequestUpdate) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUESTS).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DbError::NotFound(format!("club request {id}")))?;
        row.name = update.name.clone();
        row.description = update.description.clone();
        row.website = update.website.clone();
        row.slug_candidate = update.slug_candidate.clone();
        row.contact_email = update.contact_email.clone();
        row.officer_emails = update.officer_emails.clone();
        row.officer_phones = update.officer_phones.clone();
        row.updated_at = update.updated_at;
        Ok(())
    }

    async fn set_request_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUESTS).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DbError::NotFound(format!("club request {id}")))?;
        match kind {
            ImageKind::Logo => row.logo_url = Some(url.to_string()),
            ImageKind::Banner => row.banner_url = Some(url.to_string()),
        }
        Ok(())
    }

    async fn list_requests_by_submitter(&self, user_id: Uuid) -> Result<Vec<ClubRequest>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .requests
            .iter()
            .filter(|r| r.submitted_by == Some(user_id))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<ClubRequest>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .requests
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn set_request_review(&self, id: Uuid, review: &RequestReview) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUESTS).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DbError::NotFound(format!("club request {id}")))?;
        row.status = review.status;
        row.admin_message = review.admin_message.clone();
        row.reviewed_by = Some(review.reviewed_by);
        row.reviewed_at = Some(review.reviewed_at);
        row.updated_at = review.reviewed_at;
        Ok(())
    }

    async fn approve_request(&self, plan: &ApprovalPlan) -> Result<Uuid> {
        let mut tables = self.tables.lock().await;
        let pending = tables
            .requests
            .iter()
            .any(|r| r.id == plan.request_id && r.is_pending());
        if !pending {
            return Err(DbError::NotFound(format!("pending club request {}", plan.request_id)));
        }
        if tables.slug_taken(&plan.club.slug, None) {
            return Err(DbError::Duplicate(format!("club slug {}", plan.club.slug)));
        }
        self.check_writes(&[
            schema::TABLE_CLUB_REQUESTS,
            schema::TABLE_CLUBS,
            schema::TABLE_CLUB_TAGS,
            schema::TABLE_CLUB_MAJORS,
            schema::TABLE_CLUB_MAJOR_NOTES,
            schema::TABLE_CLUB_INVITES,
        ])
        .await?;

        let club_id = Uuid::new_v4();
        let request_id = plan.request_id;
        tables.clubs.push(club_row(club_id, &plan.club, plan.reviewed_at));

        let tags: Vec<(Uuid, String)> = tables
            .tags
            .iter()
            .filter(|(id, _)| *id == request_id)
            .map(|(_, t)| (club_id, t.clone()))
            .collect();
        let majors: Vec<(Uuid, Uuid)> = tables
            .request_majors
            .iter()
            .filter(|(id, _)| *id == request_id)
            .map(|(_, m)| (club_id, *m))
            .collect();
        let notes: Vec<(Uuid, Uuid, String)> = tables
            .major_notes
            .iter()
            .filter(|(id, _, _)| *id == request_id)
            .map(|(_, m, n)| (club_id, *m, n.clone()))
            .collect();
        tables.club_tags.extend(tags);
        tables.club_majors.extend(majors);
        tables.club_major_notes.extend(notes);

        tables.invites.extend(plan.invites.iter().map(|(email, role)| ClubInvite {
            id: Uuid::new_v4(),
            club_id,
            email: email.clone(),
            role: *role,
            created_by: Some(plan.reviewed_by),
            created_at: plan.reviewed_at,
            accepted_at: None,
        }));

        if let Some(row) = tables.requests.iter_mut().find(|r| r.id == request_id) {
            row.status = RequestStatus::Approved;
            row.admin_message = None;
            row.reviewed_by = Some(plan.reviewed_by);
            row.reviewed_at = Some(plan.reviewed_at);
            row.updated_at = plan.reviewed_at;
        }
        Ok(club_id)
    }

    async fn delete_rejected_requests(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let expired = |r: &ClubRequest| {
            r.status == RequestStatus::Rejected && r.reviewed_at.unwrap_or(r.updated_at) < cutoff
        };
        let doomed: Vec<Uuid> = tables.requests.iter().filter(|r| expired(r)).map(|r| r.id).collect();
        if dry_run || doomed.is_empty() {
            return Ok(doomed.len() as u64);
        }
        drop(tables);
        self.check_write(schema::TABLE_CLUB_REQUESTS).await?;
        tables = self.tables.lock().await;
        tables.requests.retain(|r| !doomed.contains(&r.id));
        tables.tags.retain(|(id, _)| !doomed.contains(id));
        tables.request_majors.retain(|(id, _)| !doomed.contains(id));
        tables.major_notes.retain(|(id, _, _)| !doomed.contains(id));
        Ok(doomed.len() as u64)
    }

    async fn insert_request_tags(&self, request_id: Uuid, tags: &[String]) -> Result<()> {
        if tags.is_empty() { return Ok(()); }
        self.check_write(schema::TABLE_CLUB_REQUEST_TAGS).await?;
        let mut tables = self.tables.lock().await;
        tables.tags.extend(tags.iter().map(|t| (request_id, t.clone())));
        Ok(())
    }

    async fn delete_request_tags(&self, request_id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUEST_TAGS).await?;
        self.tables.lock().await.tags.retain(|(id, _)| *id != request_id);
        Ok(())
    }

    async fn insert_request_majors(&self, request_id: Uuid, major_ids: &[Uuid]) -> Result<()> {
        if major_ids.is_empty() { return Ok(()); }
        self.check_write(schema::TABLE_CLUB_REQUEST_MAJORS).await?;
        let mut tables = self.tables.lock().await;
        tables.request_majors.extend(major_ids.iter().map(|m| (request_id, *m)));
        Ok(())
    }

    async fn delete_request_majors(&self, request_id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUEST_MAJORS).await?;
        self.tables.lock().await.request_majors.retain(|(id, _)| *id != request_id);
        Ok(())
    }

    async fn insert_request_major_notes(&self, request_id: Uuid, notes: &[(Uuid, String)]) -> Result<()> {
        if notes.is_empty() { return Ok(()); }
        self.check_write(schema::TABLE_CLUB_REQUEST_MAJOR_NOTES).await?;
        let mut tables = self.tables.lock().await;
        tables
            .major_notes
            .extend(notes.iter().map(|(m, n)| (request_id, *m, n.clone())));
        Ok(())
    }

    async fn delete_request_major_notes(&self, request_id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_REQUEST_MAJOR_NOTES).await?;
        self.tables.lock().await.major_notes.retain(|(id, _, _)| *id != request_id);
        Ok(())
    }

    async fn get_request_children(&self, request_id: Uuid) -> Result<RequestChildren> {
        let tables = self.tables.lock().await;
        let mut tags: Vec<String> = tables
            .tags
            .iter()
            .filter(|(id, _)| *id == request_id)
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort();
        let major_ids = tables
            .request_majors
            .iter()
            .filter(|(id, _)| *id == request_id)
            .map(|(_, m)| *m)
            .collect();
        let major_notes: BTreeMap<Uuid, String> = tables
            .major_notes
            .iter()
            .filter(|(id, _, _)| *id == request_id)
            .map(|(_, m, n)| (*m, n.clone()))
            .collect();
        Ok(RequestChildren { tags, major_ids, major_notes })
    }

    async fn list_majors(&self) -> Result<Vec<Major>> {
        let mut majors = self.tables.lock().await.majors.clone();
        majors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(majors)
    }

    async fn get_major(&self, id: Uuid) -> Result<Option<Major>> {
        Ok(self.tables.lock().await.majors.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_major(&self, name: &str) -> Result<Major> {
        self.check_write(schema::TABLE_MAJORS).await?;
        let mut tables = self.tables.lock().await;
        if tables.majors.iter().any(|m| m.name == name) {
            return Err(DbError::Duplicate(format!("major {name}")));
        }
        let major = Major { id: Uuid::new_v4(), name: name.to_string() };
        tables.majors.push(major.clone());
        Ok(major)
    }

    async fn rename_major(&self, id: Uuid, name: &str) -> Result<()> {
        self.check_write(schema::TABLE_MAJORS).await?;
        let mut tables = self.tables.lock().await;
        if tables.majors.iter().any(|m| m.name == name && m.id != id) {
            return Err(DbError::Duplicate(format!("major {name}")));
        }
        let row = tables
            .majors
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DbError::NotFound(format!("major {id}")))?;
        row.name = name.to_string();
        Ok(())
    }

    async fn delete_major(&self, id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_MAJORS).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.majors.len();
        tables.majors.retain(|m| m.id != id);
        if tables.majors.len() == before {
            return Err(DbError::NotFound(format!("major {id}")));
        }
        tables.request_majors.retain(|(_, m)| *m != id);
        tables.major_notes.retain(|(_, m, _)| *m != id);
        Ok(())
    }

    async fn major_in_use(&self, id: Uuid) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.club_majors.iter().any(|(_, m)| *m == id)
            || tables.club_major_notes.iter().any(|(_, m, _)| *m == id))
    }

    async fn get_club(&self, id: Uuid) -> Result<Option<Club>> {
        Ok(self.tables.lock().await.clubs.iter().find(|c| c.id == id).cloned())
    }

    async fn get_club_by_slug(&self, slug: &str) -> Result<Option<Club>> {
        let tables = self.tables.lock().await;
        Ok(tables.clubs.iter().find(|c| c.slug.as_deref() == Some(slug)).cloned())
    }

    async fn list_clubs(&self, filter: &ClubFilter) -> Result<Vec<Club>> {
        let tables = self.tables.lock().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut rows: Vec<Club> = tables
            .clubs
            .iter()
            .filter(|c| !filter.active_only || c.is_active)
            .filter(|c| {
                filter
                    .major_id
                    .map_or(true, |major| tables.club_majors.contains(&(c.id, major)))
            })
            .filter(|c| {
                needle.as_deref().map_or(true, |n| {
                    c.name.to_lowercase().contains(n)
                        || c.description.as_deref().is_some_and(|d| d.to_lowercase().contains(n))
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.display_order, a.created_at).cmp(&(b.display_order, b.created_at)));
        Ok(rows
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn list_clubs_with_counts(&self, limit: i64, offset: i64) -> Result<Vec<ClubWithCounts>> {
        let tables = self.tables.lock().await;
        let mut clubs: Vec<&Club> = tables.clubs.iter().collect();
        clubs.sort_by(|a, b| (a.display_order, a.created_at).cmp(&(b.display_order, b.created_at)));
        Ok(clubs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|club| ClubWithCounts {
                club: club.clone(),
                member_count: tables.memberships.iter().filter(|m| m.club_id == club.id).count() as i64,
                pending_invite_count: tables
                    .invites
                    .iter()
                    .filter(|i| i.club_id == club.id && i.is_pending())
                    .count() as i64,
            })
            .collect())
    }

    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>> {
        let prefix = format!("{base}-");
        let tables = self.tables.lock().await;
        Ok(tables
            .clubs
            .iter()
            .filter_map(|c| c.slug.as_deref())
            .filter(|s| {
                *s == base
                    || s.strip_prefix(&prefix)
                        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            })
            .map(str::to_string)
            .collect())
    }

    async fn insert_club(&self, club: &NewClub) -> Result<Uuid> {
        self.check_write(schema::TABLE_CLUBS).await?;
        let mut tables = self.tables.lock().await;
        if tables.slug_taken(&club.slug, None) {
            return Err(DbError::Duplicate(format!("club slug {}", club.slug)));
        }
        let id = Uuid::new_v4();
        tables.clubs.push(club_row(id, club, Utc::now()));
        Ok(id)
    }

    async fn update_club(&self, id: Uuid, club: &NewClub) -> Result<()> {
        self.check_write(schema::TABLE_CLUBS).await?;
        let mut tables = self.tables.lock().await;
        if tables.slug_taken(&club.slug, Some(id)) {
            return Err(DbError::Duplicate(format!("club slug {}", club.slug)));
        }
        let row = tables
            .clubs
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::NotFound(format!("club {id}")))?;
        *row = club_row(id, club, row.created_at);
        Ok(())
    }

    async fn set_club_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()> {
        self.check_write(schema::TABLE_CLUBS).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .clubs
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::NotFound(format!("club {id}")))?;
        match kind {
            ImageKind::Logo => row.logo_url = Some(url.to_string()),
            ImageKind::Banner => row.banner_url = Some(url.to_string()),
        }
        Ok(())
    }

    async fn delete_club(&self, id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_CLUBS).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.clubs.len();
        tables.clubs.retain(|c| c.id != id);
        if tables.clubs.len() == before {
            return Err(DbError::NotFound(format!("club {id}")));
        }
        tables.club_tags.retain(|(c, _)| *c != id);
        tables.club_majors.retain(|(c, _)| *c != id);
        tables.club_major_notes.retain(|(c, _, _)| *c != id);
        tables.memberships.retain(|m| m.club_id != id);
        tables.invites.retain(|i| i.club_id != id);
        Ok(())
    }

    async fn get_club_children(&self, club_id: Uuid) -> Result<ClubChildren> {
        Ok(self.tables.lock().await.club_children(club_id))
    }

    async fn replace_club_tags(&self, club_id: Uuid, tags: &[String]) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_TAGS).await?;
        let mut tables = self.tables.lock().await;
        tables.club_tags.retain(|(c, _)| *c != club_id);
        tables.club_tags.extend(tags.iter().map(|t| (club_id, t.clone())));
        Ok(())
    }

    async fn replace_club_majors(&self, club_id: Uuid, major_ids: &[Uuid]) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_MAJORS).await?;
        let mut tables = self.tables.lock().await;
        tables.club_majors.retain(|(c, _)| *c != club_id);
        tables.club_majors.extend(major_ids.iter().map(|m| (club_id, *m)));
        Ok(())
    }

    async fn replace_club_major_notes(&self, club_id: Uuid, notes: &[(Uuid, String)]) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_MAJOR_NOTES).await?;
        let mut tables = self.tables.lock().await;
        tables.club_major_notes.retain(|(c, _, _)| *c != club_id);
        tables.club_major_notes.extend(notes.iter().map(|(m, n)| (club_id, *m, n.clone())));
        Ok(())
    }

    async fn get_membership(&self, club_id: Uuid, user_id: Uuid) -> Result<Option<ClubMembership>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.club_id == club_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, club_id: Uuid, limit: i64, offset: i64) -> Result<(Vec<ClubMember>, i64)> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&ClubMembership> =
            tables.memberships.iter().filter(|m| m.club_id == club_id).collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .map(ClubMember::from)
            .collect();
        Ok((page, total))
    }

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Uuid> {
        self.check_write(schema::TABLE_CLUB_MEMBERSHIPS).await?;
        let mut tables = self.tables.lock().await;
        if tables
            .memberships
            .iter()
            .any(|m| m.club_id == membership.club_id && m.user_id == membership.user_id)
        {
            return Err(DbError::Duplicate(format!("membership of {}", membership.user_id)));
        }
        let id = Uuid::new_v4();
        tables.memberships.push(ClubMembership {
            id,
            club_id: membership.club_id,
            user_id: membership.user_id,
            email: membership.email.clone(),
            role: membership.role,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn set_member_role(&self, club_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_MEMBERSHIPS).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .memberships
            .iter_mut()
            .find(|m| m.club_id == club_id && m.user_id == user_id)
            .ok_or_else(|| DbError::NotFound(format!("member {user_id} of club {club_id}")))?;
        row.role = role;
        Ok(())
    }

    async fn remove_member(&self, club_id: Uuid, user_id: Uuid) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_MEMBERSHIPS).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.memberships.len();
        tables.memberships.retain(|m| !(m.club_id == club_id && m.user_id == user_id));
        if tables.memberships.len() == before {
            return Err(DbError::NotFound(format!("member {user_id} of club {club_id}")));
        }
        Ok(())
    }

    async fn find_pending_invite(&self, club_id: Uuid, email: &str) -> Result<Option<ClubInvite>> {
        if self.hide_pending_invites.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let tables = self.tables.lock().await;
        Ok(tables
            .invites
            .iter()
            .find(|i| i.club_id == club_id && i.email == email && i.is_pending())
            .cloned())
    }

    async fn insert_invite(&self, invite: &NewInvite) -> Result<Uuid> {
        self.check_write(schema::TABLE_CLUB_INVITES).await?;
        let mut tables = self.tables.lock().await;
        if tables
            .invites
            .iter()
            .any(|i| i.club_id == invite.club_id && i.email == invite.email && i.is_pending())
        {
            return Err(DbError::Duplicate(format!("pending invite for {}", invite.email)));
        }
        let id = Uuid::new_v4();
        tables.invites.push(ClubInvite {
            id,
            club_id: invite.club_id,
            email: invite.email.clone(),
            role: invite.role,
            created_by: invite.created_by,
            created_at: Utc::now(),
            accepted_at: None,
        });
        Ok(id)
    }

    async fn list_pending_invites(&self, club_id: Uuid) -> Result<Vec<ClubInvite>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<ClubInvite> = tables
            .invites
            .iter()
            .filter(|i| i.club_id == club_id && i.is_pending())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_pending_invites_for_email(&self, email: &str) -> Result<Vec<ClubInvite>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<ClubInvite> = tables
            .invites
            .iter()
            .filter(|i| i.email == email && i.is_pending())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_invite(&self, id: Uuid) -> Result<Option<ClubInvite>> {
        Ok(self.tables.lock().await.invites.iter().find(|i| i.id == id).cloned())
    }

    async fn mark_invite_accepted(&self, id: Uuid, accepted_at: DateTime<Utc>) -> Result<()> {
        self.check_write(schema::TABLE_CLUB_INVITES).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .invites
            .iter_mut()
            .find(|i| i.id == id && i.is_pending())
            .ok_or_else(|| DbError::NotFound(format!("pending invite {id}")))?;
        row.accepted_at = Some(accepted_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_request(user: Uuid) -> NewClubRequest {
        NewClubRequest {
            name: "Chess Club".into(),
            description: "Weekly games".into(),
            website: None,
            slug_candidate: None,
            contact_email: "lead@ucmerced.edu".into(),
            officer_emails: vec!["vp@ucmerced.edu".into()],
            officer_phones: vec![],
            logo_url: None,
            banner_url: None,
            submitted_by: user,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_by_submitter() {
        let store = MemoryClubStore::new();
        let user = Uuid::new_v4();
        let id = store.insert_request(&new_request(user)).await.unwrap();
        store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();

        let mine = store.list_requests_by_submitter(user).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);
        assert_eq!(mine[0].status, RequestStatus::Pending);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_request_is_not_found() {
        let store = MemoryClubStore::new();
        let update = RequestUpdate {
            name: "x".into(),
            description: "y".into(),
            website: None,
            slug_candidate: None,
            contact_email: "a@b.co".into(),
            officer_emails: vec![],
            officer_phones: vec![],
            updated_at: Utc::now(),
        };
        let err = store.update_request(Uuid::new_v4(), &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failing_table_rejects_writes() {
        let store = MemoryClubStore::new();
        store.fail_writes_to(schema::TABLE_CLUB_REQUEST_TAGS).await;
        let id = store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();
        let err = store.insert_request_tags(id, &["chess".into()]).await.unwrap_err();
        assert!(matches!(err, DbError::WriteFailed(_)));
        assert!(store.get_request_children(id).await.unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_pending_invite_is_unique_per_club_and_email() {
        let store = MemoryClubStore::new();
        let club_id = store.add_club("Chess", true).await;
        let invite = NewInvite {
            club_id,
            email: "new@ucmerced.edu".into(),
            role: MemberRole::Member,
            created_by: None,
        };
        let first = store.insert_invite(&invite).await.unwrap();
        assert!(matches!(store.insert_invite(&invite).await, Err(DbError::Duplicate(_))));

        store.mark_invite_accepted(first, Utc::now()).await.unwrap();
        assert!(store.insert_invite(&invite).await.is_ok());
    }

    #[tokio::test]
    async fn test_slugs_with_prefix_matches_numbered_suffixes_only() {
        let store = MemoryClubStore::new();
        for slug in ["acm", "acm-1", "acm-club", "acm-2"] {
            store.insert_club(&NewClub::new(slug, slug)).await.unwrap();
        }
        let mut slugs = store.slugs_with_prefix("acm").await.unwrap();
        slugs.sort();
        assert_eq!(slugs, vec!["acm", "acm-1", "acm-2"]);
    }

    #[tokio::test]
    async fn test_delete_rejected_respects_cutoff_and_dry_run() {
        let store = MemoryClubStore::new();
        let old = store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();
        let fresh = store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();
        for id in [old, fresh] {
            store
                .set_request_review(id, &RequestReview {
                    status: RequestStatus::Rejected,
                    admin_message: Some("Duplicate".into()),
                    reviewed_by: Uuid::new_v4(),
                    reviewed_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        store.backdate_request(old, Utc::now() - Duration::days(60)).await;
        let cutoff = Utc::now() - Duration::days(30);

        assert_eq!(store.delete_rejected_requests(cutoff, true).await.unwrap(), 1);
        assert!(store.get_request(old).await.unwrap().is_some());

        assert_eq!(store.delete_rejected_requests(cutoff, false).await.unwrap(), 1);
        assert!(store.get_request(old).await.unwrap().is_none());
        assert!(store.get_request(fresh).await.unwrap().is_some());
    }

    fn plan(request_id: Uuid, slug: &str) -> ApprovalPlan {
        ApprovalPlan {
            request_id,
            club: NewClub::new("Chess Club", slug),
            invites: vec![
                ("lead@ucmerced.edu".into(), MemberRole::Admin),
                ("vp@ucmerced.edu".into(), MemberRole::Officer),
            ],
            reviewed_by: Uuid::new_v4(),
            reviewed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_approve_request_copies_children_and_invites() {
        let store = MemoryClubStore::new();
        let major = store.add_major("Computer Science").await;
        let id = store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();
        store.insert_request_tags(id, &["games".into()]).await.unwrap();
        store.insert_request_majors(id, &[major]).await.unwrap();
        store.insert_request_major_notes(id, &[(major, "Strategy".into())]).await.unwrap();

        let club_id = store.approve_request(&plan(id, "chess-club")).await.unwrap();

        let children = store.club_children(club_id).await;
        assert_eq!(children.tags, vec!["games"]);
        assert_eq!(children.major_ids, vec![major]);
        assert_eq!(children.major_notes.get(&major).map(String::as_str), Some("Strategy"));
        assert_eq!(store.list_pending_invites(club_id).await.unwrap().len(), 2);
        assert_eq!(store.get_request(id).await.unwrap().unwrap().status, RequestStatus::Approved);
        assert!(store.major_in_use(major).await.unwrap());

        let again = store.approve_request(&plan(id, "chess-club-1")).await.unwrap_err();
        assert!(matches!(again, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_approval_writes_nothing() {
        let store = MemoryClubStore::new();
        let id = store.insert_request(&new_request(Uuid::new_v4())).await.unwrap();
        store.fail_writes_to(schema::TABLE_CLUB_INVITES).await;
        let writes = store.write_count();

        let err = store.approve_request(&plan(id, "chess-club")).await.unwrap_err();
        assert!(matches!(err, DbError::WriteFailed(_)));
        assert!(store.clubs().await.is_empty());
        assert!(store.invites().await.is_empty());
        assert_eq!(store.get_request(id).await.unwrap().unwrap().status, RequestStatus::Pending);
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_list_clubs_filters_and_pages() {
        let store = MemoryClubStore::new();
        let cs = store.add_major("Computer Science").await;
        let mut robotics = NewClub::new("Robotics", "robotics");
        robotics.description = Some("Build CHESS-playing robots".into());
        robotics.display_order = 2;
        let robotics_id = store.insert_club(&robotics).await.unwrap();
        let mut chess = NewClub::new("Chess Club", "chess");
        chess.display_order = 1;
        store.insert_club(&chess).await.unwrap();
        let mut hidden = NewClub::new("Old Chess", "old-chess");
        hidden.is_active = false;
        store.insert_club(&hidden).await.unwrap();
        store.replace_club_majors(robotics_id, &[cs]).await.unwrap();

        let all = ClubFilter { active_only: true, limit: 100, ..Default::default() };
        let names: Vec<String> = store.list_clubs(&all).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Chess Club", "Robotics"]);

        let search = ClubFilter { search: Some("chess".into()), ..all.clone() };
        assert_eq!(store.list_clubs(&search).await.unwrap().len(), 2);

        let by_major = ClubFilter { major_id: Some(cs), ..all.clone() };
        assert_eq!(store.list_clubs(&by_major).await.unwrap()[0].id, robotics_id);

        let paged = ClubFilter { limit: 1, offset: 1, ..all };
        assert_eq!(store.list_clubs(&paged).await.unwrap()[0].name, "Robotics");
    }

    #[tokio::test]
    async fn test_major_names_are_unique() {
        let store = MemoryClubStore::new();
        let major = store.insert_major("Physics").await.unwrap();
        assert!(matches!(store.insert_major("Physics").await, Err(DbError::Duplicate(_))));
        let other = store.insert_major("Chemistry").await.unwrap();
        assert!(matches!(store.rename_major(other.id, "Physics").await, Err(DbError::Duplicate(_))));
        store.delete_major(major.id).await.unwrap();
        assert!(matches!(store.delete_major(major.id).await, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_members_pages_and_counts() {
        let store = MemoryClubStore::new();
        let club_id = store.add_club("Chess", true).await;
        for i in 0..3 {
            store
                .insert_membership(&NewMembership {
                    club_id,
                    user_id: Uuid::new_v4(),
                    email: format!("m{i}@ucmerced.edu"),
                    role: MemberRole::Member,
                })
                .await
                .unwrap();
        }
        let (page, total) = store.list_members(club_id, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 3);
        let (rest, _) = store.list_members(club_id, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }
}
