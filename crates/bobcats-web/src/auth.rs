//! Caller identity extractors.
//!
//! Sessions are handled upstream; the auth proxy forwards the signed-in user
//! as `x-user-id` and `x-user-email`. Platform-admin routes also need
//! `Authorization: Bearer <admin session token>`.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use bobcats_clubs::Actor;
use bobcats_common::BobcatsError;
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::state::SharedState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
}

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let user_id = header(headers, USER_ID_HEADER).and_then(|v| Uuid::parse_str(v).ok())?;
    let email = header(headers, USER_EMAIL_HEADER)?;
    Some(Actor::new(user_id, email))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header(headers, AUTHORIZATION.as_str()).and_then(|v| v.strip_prefix("Bearer ")).map(str::trim)
}

fn is_platform_admin(headers: &HeaderMap, state: &SharedState) -> bool {
    match (&state.admin_token, bearer_token(headers)) {
        (Some(expected), Some(given)) => bool::from(expected.expose_secret().as_bytes().ct_eq(given.as_bytes())),
        _ => false,
    }
}

/// A signed-in user. Rejects with 401 when the identity headers are missing.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = BobcatsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(CurrentUser).ok_or(BobcatsError::Unauthorized)
    }
}

/// A platform admin. `reviewer` is the forwarded user id when present.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub reviewer: Uuid,
}

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = BobcatsError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        if !is_platform_admin(&parts.headers, state) {
            return Err(BobcatsError::Unauthorized);
        }
        let reviewer = header(&parts.headers, USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(v).ok())
            .unwrap_or(Uuid::nil());
        Ok(AdminUser { reviewer })
    }
}

/// Whoever is calling, if anyone. Never rejects.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: Option<Actor>,
    pub is_admin: bool,
}

impl FromRequestParts<SharedState> for Caller {
    type Rejection = BobcatsError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        Ok(Caller {
            user: actor_from_headers(&parts.headers),
            is_admin: is_platform_admin(&parts.headers, state),
        })
    }
}
