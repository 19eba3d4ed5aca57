//! Club request, club catalog, majors and membership services.
//!
//! Each service validates its input, writes through a [`ClubStore`], and
//! reports failures as [`BobcatsError`]. Object storage and the email worker
//! are reached through the [`ObjectStorage`] and [`EmailTrigger`] seams.
//!
//! [`ClubStore`]: bobcats_db::ClubStore
//! [`BobcatsError`]: bobcats_common::BobcatsError

pub mod clubs;
pub mod form;
pub mod images;
pub mod majors;
pub mod membership;
pub mod notify;
pub mod requests;
pub mod review;
pub mod storage;

use uuid::Uuid;

pub use clubs::{ClubDetail, ClubForm, ClubPatch, ClubQuery, ClubService, ClubSummary, DEFAULT_CLUB_PAGE_SIZE};
pub use form::{ClubRequestForm, ValidatedForm};
pub use images::{ImageUpload, MAX_IMAGE_BYTES};
pub use majors::MajorService;
pub use membership::{MemberPage, MembershipService, DEFAULT_MEMBER_PAGE_SIZE};
pub use notify::{fire_and_forget, EdgeFunctionTrigger, EmailTrigger, NoopTrigger, RecordingTrigger};
pub use requests::{ClubRequestDetail, ClubRequestService};
pub use review::{ApprovalOutcome, CleanupOutcome, ReviewService};
pub use storage::{MemoryStorage, ObjectStorage, SupabaseStorage, STORAGE_BUCKET};

/// The signed-in user an action runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
}

impl Actor {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self { user_id, email: email.into().trim().to_lowercase() }
    }
}
