//! BetterBobcats Database Layer
//!
//! Defines the [`ClubStore`] seam the club services write through, with two
//! implementations:
//!
//! - [`PgClubStore`]: Postgres via sqlx, one statement per call except for
//!   request approval and child-row replacement, which run in transactions.
//! - [`MemoryClubStore`]: in-process tables for tests and local development,
//!   with write-failure injection per table.
//!
//! # Example
//!
//! ```rust,no_run
//! use bobcats_db::{ClubStore, PgClubStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PgClubStore::connect("postgres://localhost/bobcats", 5, 1).await?;
//!     store.initialize().await?;
//!     let majors = store.list_majors().await?;
//!     println!("{} majors", majors.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod schema;
pub mod store;
pub mod postgres;
pub mod memory;

pub use error::{DbError, Result};
pub use memory::MemoryClubStore;
pub use postgres::PgClubStore;
pub use schema::{
    TABLE_CLUBS, TABLE_CLUB_INVITES, TABLE_CLUB_MAJORS, TABLE_CLUB_MAJOR_NOTES,
    TABLE_CLUB_MEMBERSHIPS, TABLE_CLUB_REQUESTS, TABLE_CLUB_REQUEST_MAJORS,
    TABLE_CLUB_REQUEST_MAJOR_NOTES, TABLE_CLUB_REQUEST_TAGS, TABLE_CLUB_TAGS, TABLE_MAJORS,
};
pub use store::{
    ApprovalPlan, ClubFilter, ClubStore, NewClub, NewClubRequest, NewInvite, NewMembership,
    RequestReview, RequestUpdate,
};
