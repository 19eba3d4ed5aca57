//! bobcats-web: HTTP API for club requests, memberships, admin review and
//! the career path catalog.

pub mod auth;
pub mod handlers;
pub mod router;
pub mod state;
