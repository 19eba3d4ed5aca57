//! PostgreSQL implementation of [`ClubStore`].
//!
//! Handles:
//! - club request INSERT/UPDATE and review bookkeeping
//! - child-table bulk inserts via `UNNEST`
//! - club catalog, club admin writes and majors
//! - membership and invite rows
//!
//! Most methods issue one statement against the pool and leave partial
//! failure to the services. Request approval and club child-row replacement
//! run inside a transaction.

use async_trait::async_trait;
use bobcats_common::{
    Club, ClubChildren, ClubInvite, ClubMember, ClubMembership, ClubRequest, ClubWithCounts,
    ImageKind, Major, MemberRole, RequestChildren, RequestStatus,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::schema::{self, SCHEMA_STATEMENTS};
use crate::store::{
    ApprovalPlan, ClubFilter, ClubStore, NewClub, NewClubRequest, NewInvite, NewMembership,
    RequestReview, RequestUpdate,
};

const REQUEST_COLUMNS: &str = "id, name, description, website, slug_candidate, contact_email, \
     officer_emails, officer_phones, logo_url, banner_url, status, admin_message, \
     reviewed_at, reviewed_by, submitted_by, created_at, updated_at";

const CLUB_COLUMNS: &str = "id, name, slug, description, website, logo_url, banner_url, \
     is_active, display_order, created_at";

const INVITE_COLUMNS: &str = "id, club_id, email, role, created_by, created_at, accepted_at";

/// Postgres-backed club store.
#[derive(Clone)]
pub struct PgClubStore {
    pool: PgPool,
}

impl PgClubStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(url)
            .await?;
        debug!(max_connections, min_connections, "connected to Postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool { &self.pool }

    /// Create tables and indexes that do not exist yet.
    pub async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!(statements = SCHEMA_STATEMENTS.len(), "database schema ready");
        Ok(())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn parse_text<T>(row: &PgRow, column: &str, table: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| DbError::CorruptRow { table, detail: format!("{column}: {e}") })
}

fn row_to_request(row: &PgRow) -> Result<ClubRequest> {
    Ok(ClubRequest {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        website: row.try_get("website")?,
        slug_candidate: row.try_get("slug_candidate")?,
        contact_email: row.try_get("contact_email")?,
        officer_emails: row.try_get("officer_emails")?,
        officer_phones: row.try_get("officer_phones")?,
        logo_url: row.try_get("logo_url")?,
        banner_url: row.try_get("banner_url")?,
        status: parse_text::<RequestStatus>(row, "status", schema::TABLE_CLUB_REQUESTS)?,
        admin_message: row.try_get("admin_message")?,
        reviewed_at: row.try_get("reviewed_at")?,
        reviewed_by: row.try_get("reviewed_by")?,
        submitted_by: row.try_get("submitted_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_club(row: &PgRow) -> Result<Club> {
    Ok(Club {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        website: row.try_get("website")?,
        logo_url: row.try_get("logo_url")?,
        banner_url: row.try_get("banner_url")?,
        is_active: row.try_get("is_active")?,
        display_order: row.try_get("display_order")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_membership(row: &PgRow) -> Result<ClubMembership> {
    Ok(ClubMembership {
        id: row.try_get("id")?,
        club_id: row.try_get("club_id")?,
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        role: parse_text::<MemberRole>(row, "role", schema::TABLE_CLUB_MEMBERSHIPS)?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_invite(row: &PgRow) -> Result<ClubInvite> {
    Ok(ClubInvite {
        id: row.try_get("id")?,
        club_id: row.try_get("club_id")?,
        email: row.try_get("email")?,
        role: parse_text::<MemberRole>(row, "role", schema::TABLE_CLUB_INVITES)?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        accepted_at: row.try_get("accepted_at")?,
    })
}

fn expect_rows(affected: u64, what: impl Into<String>) -> Result<()> {
    if affected == 0 {
        return Err(DbError::NotFound(what.into()));
    }
    Ok(())
}

/// Split `(major_id, note)` pairs into the two arrays `UNNEST` takes.
fn unzip_notes(notes: &[(Uuid, String)]) -> (Vec<Uuid>, Vec<String>) {
    notes.iter().cloned().unzip()
}

/// `%term%` for ILIKE, with the pattern metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

async fn insert_club_row(tx: &mut Transaction<'_, Postgres>, club: &NewClub) -> Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO clubs
            (name, slug, description, website, logo_url, banner_url, is_active, display_order)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING id
        "#,
    )
    .bind(&club.name)
    .bind(&club.slug)
    .bind(&club.description)
    .bind(&club.website)
    .bind(&club.logo_url)
    .bind(&club.banner_url)
    .bind(club.is_active)
    .bind(club.display_order)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

#[async_trait]
impl ClubStore for PgClubStore {
    // ── Club requests ────────────────────────────────────────────────────────

    async fn insert_request(&self, request: &NewClubRequest) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO club_requests
                (name, description, website, slug_candidate, contact_email,
                 officer_emails, officer_phones, logo_url, banner_url,
                 submitted_by, status)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,'pending')
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.website)
        .bind(&request.slug_candidate)
        .bind(&request.contact_email)
        .bind(&request.officer_emails)
        .bind(&request.officer_phones)
        .bind(&request.logo_url)
        .bind(&request.banner_url)
        .bind(request.submitted_by)
        .fetch_one(&self.pool)
        .await?;

        debug!(request_id = %id, "inserted club request");
        Ok(id)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<ClubRequest>> {
        let row = sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM club_requests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_request).transpose()
    }

    async fn update_request(&self, id: Uuid, update: &RequestUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE club_requests SET
                name = $2, description = $3, website = $4, slug_candidate = $5,
                contact_email = $6, officer_emails = $7, officer_phones = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.website)
        .bind(&update.slug_candidate)
        .bind(&update.contact_email)
        .bind(&update.officer_emails)
        .bind(&update.officer_phones)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;
        expect_rows(result.rows_affected(), format!("club request {id}"))
    }

    async fn set_request_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()> {
        let sql = match kind {
            ImageKind::Logo => "UPDATE club_requests SET logo_url = $2 WHERE id = $1",
            ImageKind::Banner => "UPDATE club_requests SET banner_url = $2 WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(id).bind(url).execute(&self.pool).await?;
        expect_rows(result.rows_affected(), format!("club request {id}"))
    }

    async fn list_requests_by_submitter(&self, user_id: Uuid) -> Result<Vec<ClubRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM club_requests WHERE submitted_by = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<ClubRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM club_requests \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn set_request_review(&self, id: Uuid, review: &RequestReview) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE club_requests SET
                status = $2, admin_message = $3, reviewed_by = $4,
                reviewed_at = $5, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(review.status.as_str())
        .bind(&review.admin_message)
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .execute(&self.pool)
        .await?;
        expect_rows(result.rows_affected(), format!("club request {id}"))
    }

    async fn approve_request(&self, plan: &ApprovalPlan) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            r#"
            UPDATE club_requests SET
                status = 'approved', admin_message = NULL, reviewed_by = $2,
                reviewed_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(plan.request_id)
        .bind(plan.reviewed_by)
        .bind(plan.reviewed_at)
        .execute(&mut *tx)
        .await?;
        expect_rows(marked.rows_affected(), format!("pending club request {}", plan.request_id))?;

        let club_id = insert_club_row(&mut tx, &plan.club).await?;

        sqlx::query("INSERT INTO club_tags (club_id, tag) SELECT $1, tag FROM club_request_tags WHERE request_id = $2")
            .bind(club_id)
            .bind(plan.request_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO club_majors (club_id, major_id) \
             SELECT $1, major_id FROM club_request_majors WHERE request_id = $2",
        )
        .bind(club_id)
        .bind(plan.request_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO club_major_notes (club_id, major_id, note) \
             SELECT $1, major_id, note FROM club_request_major_notes WHERE request_id = $2",
        )
        .bind(club_id)
        .bind(plan.request_id)
        .execute(&mut *tx)
        .await?;

        let (emails, roles): (Vec<String>, Vec<&'static str>) =
            plan.invites.iter().map(|(email, role)| (email.clone(), role.as_str())).unzip();
        if !emails.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO club_invites (club_id, email, role, created_by)
                SELECT $1, i.email, i.role, $4
                FROM UNNEST($2::text[], $3::text[]) AS i(email, role)
                "#,
            )
            .bind(club_id)
            .bind(&emails)
            .bind(&roles)
            .bind(plan.reviewed_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(request_id = %plan.request_id, %club_id, invites = emails.len(), "approval committed");
        Ok(club_id)
    }

    async fn delete_rejected_requests(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<u64> {
        if dry_run {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM club_requests \
                 WHERE status = 'rejected' AND COALESCE(reviewed_at, updated_at) < $1",
            )
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await?;
            return Ok(count.max(0) as u64);
        }

        let result = sqlx::query(
            "DELETE FROM club_requests \
             WHERE status = 'rejected' AND COALESCE(reviewed_at, updated_at) < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ── Request child rows ───────────────────────────────────────────────────

    async fn insert_request_tags(&self, request_id: Uuid, tags: &[String]) -> Result<()> {
        if tags.is_empty() { return Ok(()); }
        sqlx::query("INSERT INTO club_request_tags (request_id, tag) SELECT $1, UNNEST($2::text[])")
            .bind(request_id)
            .bind(tags)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_request_tags(&self, request_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM club_request_tags WHERE request_id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_request_majors(&self, request_id: Uuid, major_ids: &[Uuid]) -> Result<()> {
        if major_ids.is_empty() { return Ok(()); }
        sqlx::query("INSERT INTO club_request_majors (request_id, major_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(request_id)
            .bind(major_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_request_majors(&self, request_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM club_request_majors WHERE request_id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_request_major_notes(&self, request_id: Uuid, notes: &[(Uuid, String)]) -> Result<()> {
        if notes.is_empty() { return Ok(()); }
        let (major_ids, texts) = unzip_notes(notes);
        sqlx::query(
            r#"
            INSERT INTO club_request_major_notes (request_id, major_id, note)
            SELECT $1, n.major_id, n.note
            FROM UNNEST($2::uuid[], $3::text[]) AS n(major_id, note)
            "#,
        )
        .bind(request_id)
        .bind(&major_ids)
        .bind(&texts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_request_major_notes(&self, request_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM club_request_major_notes WHERE request_id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_request_children(&self, request_id: Uuid) -> Result<RequestChildren> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT tag FROM club_request_tags WHERE request_id = $1 ORDER BY tag")
                .bind(request_id)
                .fetch_all(&self.pool)
                .await?;

        let major_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT major_id FROM club_request_majors WHERE request_id = $1")
                .bind(request_id)
                .fetch_all(&self.pool)
                .await?;

        let notes: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT major_id, note FROM club_request_major_notes WHERE request_id = $1",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RequestChildren { tags, major_ids, major_notes: notes.into_iter().collect() })
    }

    // ── Majors ───────────────────────────────────────────────────────────────

    async fn list_majors(&self) -> Result<Vec<Major>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM majors ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id, name)| Major { id, name }).collect())
    }

    async fn get_major(&self, id: Uuid) -> Result<Option<Major>> {
        let row: Option<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM majors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id, name)| Major { id, name }))
    }

    async fn insert_major(&self, name: &str) -> Result<Major> {
        let (id, name): (Uuid, String) =
            sqlx::query_as("INSERT INTO majors (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(Major { id, name })
    }

    async fn rename_major(&self, id: Uuid, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE majors SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("major {id}"))
    }

    async fn delete_major(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM majors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("major {id}"))
    }

    async fn major_in_use(&self, id: Uuid) -> Result<bool> {
        let used: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM club_majors WHERE major_id = $1) \
             OR EXISTS (SELECT 1 FROM club_major_notes WHERE major_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(used)
    }

    // ── Clubs ────────────────────────────────────────────────────────────────

    async fn get_club(&self, id: Uuid) -> Result<Option<Club>> {
        let row = sqlx::query(&format!("SELECT {CLUB_COLUMNS} FROM clubs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_club).transpose()
    }

    async fn get_club_by_slug(&self, slug: &str) -> Result<Option<Club>> {
        let row = sqlx::query(&format!("SELECT {CLUB_COLUMNS} FROM clubs WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_club).transpose()
    }

    async fn list_clubs(&self, filter: &ClubFilter) -> Result<Vec<Club>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLUB_COLUMNS} FROM clubs c \
             WHERE (NOT $1 OR c.is_active) \
               AND ($2::uuid IS NULL OR EXISTS \
                    (SELECT 1 FROM club_majors m WHERE m.club_id = c.id AND m.major_id = $2)) \
               AND ($3::text IS NULL OR c.name ILIKE $3 OR c.description ILIKE $3) \
             ORDER BY c.display_order ASC, c.created_at ASC \
             LIMIT $4 OFFSET $5"
        ))
        .bind(filter.active_only)
        .bind(filter.major_id)
        .bind(filter.search.as_deref().map(like_pattern))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_club).collect()
    }

    async fn list_clubs_with_counts(&self, limit: i64, offset: i64) -> Result<Vec<ClubWithCounts>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLUB_COLUMNS}, \
                (SELECT COUNT(*) FROM club_memberships m WHERE m.club_id = clubs.id) AS member_count, \
                (SELECT COUNT(*) FROM club_invites i \
                  WHERE i.club_id = clubs.id AND i.accepted_at IS NULL) AS pending_invite_count \
             FROM clubs ORDER BY display_order ASC, created_at ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(ClubWithCounts {
                    club: row_to_club(row)?,
                    member_count: row.try_get("member_count")?,
                    pending_invite_count: row.try_get("pending_invite_count")?,
                })
            })
            .collect()
    }

    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>> {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM clubs WHERE slug = $1 OR slug ~ ('^' || $2 || '-[0-9]+$')",
        )
        .bind(base)
        .bind(regex_escape(base))
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    async fn insert_club(&self, club: &NewClub) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;
        let id = insert_club_row(&mut tx, club).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn update_club(&self, id: Uuid, club: &NewClub) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE clubs SET
                name = $2, slug = $3, description = $4, website = $5,
                logo_url = $6, banner_url = $7, is_active = $8, display_order = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&club.name)
        .bind(&club.slug)
        .bind(&club.description)
        .bind(&club.website)
        .bind(&club.logo_url)
        .bind(&club.banner_url)
        .bind(club.is_active)
        .bind(club.display_order)
        .execute(&self.pool)
        .await?;
        expect_rows(result.rows_affected(), format!("club {id}"))
    }

    async fn set_club_image(&self, id: Uuid, kind: ImageKind, url: &str) -> Result<()> {
        let sql = match kind {
            ImageKind::Logo => "UPDATE clubs SET logo_url = $2 WHERE id = $1",
            ImageKind::Banner => "UPDATE clubs SET banner_url = $2 WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(id).bind(url).execute(&self.pool).await?;
        expect_rows(result.rows_affected(), format!("club {id}"))
    }

    async fn delete_club(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("club {id}"))
    }

    async fn get_club_children(&self, club_id: Uuid) -> Result<ClubChildren> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT tag FROM club_tags WHERE club_id = $1 ORDER BY tag")
            .bind(club_id)
            .fetch_all(&self.pool)
            .await?;

        let major_ids: Vec<Uuid> = sqlx::query_scalar("SELECT major_id FROM club_majors WHERE club_id = $1")
            .bind(club_id)
            .fetch_all(&self.pool)
            .await?;

        let notes: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT major_id, note FROM club_major_notes WHERE club_id = $1")
                .bind(club_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ClubChildren { tags, major_ids, major_notes: notes.into_iter().collect() })
    }

    async fn replace_club_tags(&self, club_id: Uuid, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM club_tags WHERE club_id = $1")
            .bind(club_id)
            .execute(&mut *tx)
            .await?;
        if !tags.is_empty() {
            sqlx::query("INSERT INTO club_tags (club_id, tag) SELECT $1, UNNEST($2::text[])")
                .bind(club_id)
                .bind(tags)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_club_majors(&self, club_id: Uuid, major_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM club_majors WHERE club_id = $1")
            .bind(club_id)
            .execute(&mut *tx)
            .await?;
        if !major_ids.is_empty() {
            sqlx::query("INSERT INTO club_majors (club_id, major_id) SELECT $1, UNNEST($2::uuid[])")
                .bind(club_id)
                .bind(major_ids)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_club_major_notes(&self, club_id: Uuid, notes: &[(Uuid, String)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM club_major_notes WHERE club_id = $1")
            .bind(club_id)
            .execute(&mut *tx)
            .await?;
        if !notes.is_empty() {
            let (major_ids, texts) = unzip_notes(notes);
            sqlx::query(
                r#"
                INSERT INTO club_major_notes (club_id, major_id, note)
                SELECT $1, n.major_id, n.note
                FROM UNNEST($2::uuid[], $3::text[]) AS n(major_id, note)
                "#,
            )
            .bind(club_id)
            .bind(&major_ids)
            .bind(&texts)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ── Memberships ──────────────────────────────────────────────────────────

    async fn get_membership(&self, club_id: Uuid, user_id: Uuid) -> Result<Option<ClubMembership>> {
        let row = sqlx::query(
            "SELECT id, club_id, user_id, email, role, created_at FROM club_memberships \
             WHERE club_id = $1 AND user_id = $2",
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_membership).transpose()
    }

    async fn list_members(&self, club_id: Uuid, limit: i64, offset: i64) -> Result<(Vec<ClubMember>, i64)> {
        let rows = sqlx::query(
            "SELECT id, club_id, user_id, email, role, created_at FROM club_memberships \
             WHERE club_id = $1 ORDER BY created_at ASC LIMIT $2 OFFSET $3",
        )
        .bind(club_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM club_memberships WHERE club_id = $1")
            .bind(club_id)
            .fetch_one(&self.pool)
            .await?;

        let members = rows
            .iter()
            .map(|r| row_to_membership(r).map(ClubMember::from))
            .collect::<Result<Vec<_>>>()?;
        Ok((members, total))
    }

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO club_memberships (club_id, user_id, email, role) VALUES ($1,$2,$3,$4) RETURNING id",
        )
        .bind(membership.club_id)
        .bind(membership.user_id)
        .bind(&membership.email)
        .bind(membership.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn set_member_role(&self, club_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<()> {
        let result = sqlx::query("UPDATE club_memberships SET role = $3 WHERE club_id = $1 AND user_id = $2")
            .bind(club_id)
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("member {user_id} of club {club_id}"))
    }

    async fn remove_member(&self, club_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM club_memberships WHERE club_id = $1 AND user_id = $2")
            .bind(club_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("member {user_id} of club {club_id}"))
    }

    // ── Invites ──────────────────────────────────────────────────────────────

    async fn find_pending_invite(&self, club_id: Uuid, email: &str) -> Result<Option<ClubInvite>> {
        let row = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM club_invites \
             WHERE club_id = $1 AND email = $2 AND accepted_at IS NULL LIMIT 1"
        ))
        .bind(club_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_invite).transpose()
    }

    async fn insert_invite(&self, invite: &NewInvite) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO club_invites (club_id, email, role, created_by) VALUES ($1,$2,$3,$4) RETURNING id",
        )
        .bind(invite.club_id)
        .bind(&invite.email)
        .bind(invite.role.as_str())
        .bind(invite.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_pending_invites(&self, club_id: Uuid) -> Result<Vec<ClubInvite>> {
        let rows = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM club_invites \
             WHERE club_id = $1 AND accepted_at IS NULL ORDER BY created_at DESC"
        ))
        .bind(club_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_invite).collect()
    }

    async fn list_pending_invites_for_email(&self, email: &str) -> Result<Vec<ClubInvite>> {
        let rows = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM club_invites \
             WHERE email = $1 AND accepted_at IS NULL ORDER BY created_at DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_invite).collect()
    }

    async fn get_invite(&self, id: Uuid) -> Result<Option<ClubInvite>> {
        let row = sqlx::query(&format!("SELECT {INVITE_COLUMNS} FROM club_invites WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_invite).transpose()
    }

    async fn mark_invite_accepted(&self, id: Uuid, accepted_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE club_invites SET accepted_at = $2 WHERE id = $1 AND accepted_at IS NULL")
            .bind(id)
            .bind(accepted_at)
            .execute(&self.pool)
            .await?;
        expect_rows(result.rows_affected(), format!("pending invite {id}"))
    }
}

/// Escape POSIX regex metacharacters so a slug can be embedded in `~`.
fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("acm"), "acm");
        assert_eq!(regex_escape("c++"), "c\\+\\+");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("chess"), "%chess%");
        assert_eq!(like_pattern("100%_fun"), "%100\\%\\_fun%");
    }

    #[test]
    fn test_expect_rows() {
        assert!(expect_rows(1, "x").is_ok());
        assert!(matches!(expect_rows(0, "x"), Err(DbError::NotFound(_))));
    }
}
