//! Table names and the idempotent Postgres schema.

pub const TABLE_MAJORS: &str = "majors";
pub const TABLE_CLUBS: &str = "clubs";
pub const TABLE_CLUB_REQUESTS: &str = "club_requests";
pub const TABLE_CLUB_REQUEST_TAGS: &str = "club_request_tags";
pub const TABLE_CLUB_REQUEST_MAJORS: &str = "club_request_majors";
pub const TABLE_CLUB_REQUEST_MAJOR_NOTES: &str = "club_request_major_notes";
pub const TABLE_CLUB_TAGS: &str = "club_tags";
pub const TABLE_CLUB_MAJORS: &str = "club_majors";
pub const TABLE_CLUB_MAJOR_NOTES: &str = "club_major_notes";
pub const TABLE_CLUB_MEMBERSHIPS: &str = "club_memberships";
pub const TABLE_CLUB_INVITES: &str = "club_invites";

/// Statements run in order by [`crate::PgClubStore::initialize`].
/// Row-level security policies are managed outside this service.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS majors (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name        TEXT NOT NULL UNIQUE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clubs (
        id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name           TEXT NOT NULL,
        slug           TEXT UNIQUE,
        description    TEXT,
        website        TEXT,
        logo_url       TEXT,
        banner_url     TEXT,
        is_active      BOOLEAN NOT NULL DEFAULT TRUE,
        display_order  INTEGER NOT NULL DEFAULT 0,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_requests (
        id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name            TEXT NOT NULL,
        description     TEXT NOT NULL,
        website         TEXT,
        slug_candidate  TEXT,
        contact_email   TEXT NOT NULL,
        officer_emails  TEXT[] NOT NULL DEFAULT '{}',
        officer_phones  TEXT[] NOT NULL DEFAULT '{}',
        logo_url        TEXT,
        banner_url      TEXT,
        status          TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'approved', 'rejected')),
        admin_message   TEXT,
        reviewed_at     TIMESTAMPTZ,
        reviewed_by     UUID,
        submitted_by    UUID,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_request_tags (
        request_id  UUID NOT NULL REFERENCES club_requests(id) ON DELETE CASCADE,
        tag         TEXT NOT NULL,
        PRIMARY KEY (request_id, tag)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_request_majors (
        request_id  UUID NOT NULL REFERENCES club_requests(id) ON DELETE CASCADE,
        major_id    UUID NOT NULL REFERENCES majors(id) ON DELETE CASCADE,
        PRIMARY KEY (request_id, major_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_request_major_notes (
        request_id  UUID NOT NULL REFERENCES club_requests(id) ON DELETE CASCADE,
        major_id    UUID NOT NULL REFERENCES majors(id) ON DELETE CASCADE,
        note        TEXT NOT NULL,
        PRIMARY KEY (request_id, major_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_tags (
        club_id  UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
        tag      TEXT NOT NULL,
        PRIMARY KEY (club_id, tag)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_majors (
        club_id   UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
        major_id  UUID NOT NULL REFERENCES majors(id) ON DELETE RESTRICT,
        PRIMARY KEY (club_id, major_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_major_notes (
        club_id   UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
        major_id  UUID NOT NULL REFERENCES majors(id) ON DELETE RESTRICT,
        note      TEXT NOT NULL,
        PRIMARY KEY (club_id, major_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_memberships (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        club_id     UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
        user_id     UUID NOT NULL,
        email       TEXT NOT NULL,
        role        TEXT NOT NULL CHECK (role IN ('admin', 'officer', 'member')),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (club_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS club_invites (
        id           UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        club_id      UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
        email        TEXT NOT NULL,
        role         TEXT NOT NULL CHECK (role IN ('admin', 'officer', 'member')),
        created_by   UUID,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        accepted_at  TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS club_invites_one_pending
        ON club_invites (club_id, email) WHERE accepted_at IS NULL
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS clubs_display_order
        ON clubs (display_order, created_at)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS club_requests_submitted_by
        ON club_requests (submitted_by, created_at DESC)
    "#,
];
