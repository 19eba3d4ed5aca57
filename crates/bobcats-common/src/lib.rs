//! bobcats-common: shared types, errors, and helpers used across all BetterBobcats crates.

pub mod error;
pub mod models;
pub mod email;
pub mod slug;

// Re-export commonly used types
pub use error::{BobcatsError, Result};
pub use models::{
    ActionResponse, Club, ClubChildren, ClubInvite, ClubMember, ClubMembership, ClubRequest,
    ClubWithCounts, ImageKind, Major, MemberRole, RequestChildren, RequestStatus,
};
