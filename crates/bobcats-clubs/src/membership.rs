//! Club membership management: roles, removal, invites.
//!
//! Guards that only depend on the caller run before the store is touched.
//! The caller's club-admin rights are checked before anything about the
//! target member is read, and every guard fails before any write.

use std::sync::Arc;

use bobcats_common::email::normalize_invite_email;
use bobcats_common::{BobcatsError, Club, ClubInvite, ClubMember, MemberRole, Result};
use bobcats_db::{ClubStore, DbError, NewInvite, NewMembership};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::notify::{fire_and_forget, EmailTrigger};
use crate::Actor;

pub const DEFAULT_MEMBER_PAGE_SIZE: i64 = 25;

const DUPLICATE_INVITE: &str = "An invite has already been sent to this email address.";

#[derive(Debug, Clone, Serialize)]
pub struct MemberPage {
    pub members: Vec<ClubMember>,
    pub total: i64,
}

/// Why a club is refusing membership changes.
#[derive(Debug, Clone, Copy)]
enum ClubAction {
    ChangeRole,
    Remove,
    Invite,
}

impl ClubAction {
    fn deactivated_message(self) -> &'static str {
        match self {
            ClubAction::ChangeRole => "Cannot change roles while the club is deactivated.",
            ClubAction::Remove => "Cannot remove members while the club is deactivated.",
            ClubAction::Invite => "Cannot invite members while the club is deactivated.",
        }
    }
}

pub struct MembershipService {
    store: Arc<dyn ClubStore>,
    trigger: Arc<dyn EmailTrigger>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn ClubStore>, trigger: Arc<dyn EmailTrigger>) -> Self {
        Self { store, trigger }
    }

    async fn load_club(&self, club_id: Uuid) -> Result<Club> {
        self.store
            .get_club(club_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Club not found"))
    }

    async fn require_club_admin(&self, actor: &Actor, club_id: Uuid) -> Result<()> {
        let membership = self.store.get_membership(club_id, actor.user_id).await?;
        match membership {
            Some(m) if m.role == MemberRole::Admin => Ok(()),
            _ => Err(BobcatsError::forbidden("Only club admins can manage members.")),
        }
    }

    /// Club must exist, be active, and the actor must be one of its admins.
    async fn authorize(&self, actor: &Actor, club_id: Uuid, action: ClubAction) -> Result<()> {
        let club = self.load_club(club_id).await?;
        self.require_club_admin(actor, club_id).await?;
        if !club.is_active {
            return Err(BobcatsError::validation(action.deactivated_message()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn change_role(&self, actor: &Actor, club_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<()> {
        if user_id == actor.user_id {
            return Err(BobcatsError::validation("You cannot change your own role."));
        }
        self.authorize(actor, club_id, ClubAction::ChangeRole).await?;

        self.store.set_member_role(club_id, user_id, role).await.map_err(|e| match e {
            DbError::NotFound(_) => BobcatsError::not_found("Member not found"),
            other => other.into(),
        })?;
        info!(%club_id, %user_id, role = %role, "member role changed");
        Ok(())
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn remove_member(&self, actor: &Actor, club_id: Uuid, user_id: Uuid) -> Result<()> {
        if user_id == actor.user_id {
            return Err(BobcatsError::validation("You cannot remove yourself from the club."));
        }
        self.authorize(actor, club_id, ClubAction::Remove).await?;
        let target = self
            .store
            .get_membership(club_id, user_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Member not found"))?;
        if target.role == MemberRole::Admin {
            return Err(BobcatsError::validation(
                "Admins cannot be removed. Change their role to officer or member first.",
            ));
        }

        self.store.remove_member(club_id, user_id).await?;
        info!(%club_id, %user_id, "member removed");
        Ok(())
    }

    /// Create an invite and poke the email worker. Returns the invite id.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn invite(&self, actor: &Actor, club_id: Uuid, email: &str, role: MemberRole) -> Result<Uuid> {
        let email = normalize_invite_email(email)?;
        self.authorize(actor, club_id, ClubAction::Invite).await?;

        if self.store.find_pending_invite(club_id, &email).await?.is_some() {
            return Err(BobcatsError::conflict(DUPLICATE_INVITE));
        }

        let invite_id = self
            .store
            .insert_invite(&NewInvite { club_id, email: email.clone(), role, created_by: Some(actor.user_id) })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => BobcatsError::conflict(DUPLICATE_INVITE),
                other => other.into(),
            })?;

        info!(%club_id, %invite_id, role = %role, "club invite created");
        fire_and_forget(self.trigger.clone(), "club invite");
        Ok(invite_id)
    }

    pub async fn list_members(&self, actor: &Actor, club_id: Uuid, limit: Option<i64>, offset: Option<i64>) -> Result<MemberPage> {
        self.load_club(club_id).await?;
        self.require_club_admin(actor, club_id).await?;
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_MEMBER_PAGE_SIZE);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        let (members, total) = self.store.list_members(club_id, limit, offset).await?;
        Ok(MemberPage { members, total })
    }

    pub async fn pending_invites(&self, actor: &Actor, club_id: Uuid) -> Result<Vec<ClubInvite>> {
        self.load_club(club_id).await?;
        self.require_club_admin(actor, club_id).await?;
        Ok(self.store.list_pending_invites(club_id).await?)
    }

    /// Invites addressed to the caller that have not been accepted.
    pub async fn my_invites(&self, actor: &Actor) -> Result<Vec<ClubInvite>> {
        Ok(self.store.list_pending_invites_for_email(&actor.email).await?)
    }

    /// Join the club an invite points to, with the invite's role.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn accept_invite(&self, actor: &Actor, invite_id: Uuid) -> Result<Uuid> {
        let invite = self
            .store
            .get_invite(invite_id)
            .await?
            .ok_or_else(|| BobcatsError::not_found("Invite not found"))?;
        if !invite.is_pending() {
            return Err(BobcatsError::conflict("This invite has already been accepted."));
        }
        if invite.email != actor.email {
            return Err(BobcatsError::forbidden("This invite was sent to a different email address."));
        }

        let existing = self.store.get_membership(invite.club_id, actor.user_id).await?;
        if existing.is_none() {
            self.store
                .insert_membership(&NewMembership {
                    club_id: invite.club_id,
                    user_id: actor.user_id,
                    email: actor.email.clone(),
                    role: invite.role,
                })
                .await?;
        }
        self.store.mark_invite_accepted(invite_id, Utc::now()).await?;

        info!(club_id = %invite.club_id, %invite_id, "invite accepted");
        Ok(invite.club_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingTrigger;
    use bobcats_db::MemoryClubStore;

    struct Fixture {
        store: Arc<MemoryClubStore>,
        trigger: Arc<RecordingTrigger>,
        svc: MembershipService,
        club_id: Uuid,
        admin: Actor,
    }

    async fn fixture(active: bool) -> Fixture {
        let store = Arc::new(MemoryClubStore::new());
        let trigger = Arc::new(RecordingTrigger::new());
        let club_id = store.add_club("Chess", active).await;
        let admin = Actor::new(Uuid::new_v4(), "admin@ucmerced.edu");
        store
            .insert_membership(&NewMembership {
                club_id,
                user_id: admin.user_id,
                email: admin.email.clone(),
                role: MemberRole::Admin,
            })
            .await
            .unwrap();
        let svc = MembershipService::new(store.clone(), trigger.clone());
        Fixture { store, trigger, svc, club_id, admin }
    }

    async fn add_member(f: &Fixture, role: MemberRole) -> Uuid {
        let user_id = Uuid::new_v4();
        f.store
            .insert_membership(&NewMembership {
                club_id: f.club_id,
                user_id,
                email: format!("{user_id}@ucmerced.edu"),
                role,
            })
            .await
            .unwrap();
        user_id
    }

    #[tokio::test]
    async fn test_cannot_change_own_role() {
        let f = fixture(true).await;
        let writes = f.store.write_count();
        let err = f.svc.change_role(&f.admin, f.club_id, f.admin.user_id, MemberRole::Member).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot change your own role.");
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_cannot_remove_self_or_admin() {
        let f = fixture(true).await;
        let other_admin = add_member(&f, MemberRole::Admin).await;
        let writes = f.store.write_count();

        let err = f.svc.remove_member(&f.admin, f.club_id, f.admin.user_id).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot remove yourself from the club.");

        let err = f.svc.remove_member(&f.admin, f.club_id, other_admin).await.unwrap_err();
        assert_eq!(err.to_string(), "Admins cannot be removed. Change their role to officer or member first.");
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_admin_can_demote_then_remove() {
        let f = fixture(true).await;
        let other = add_member(&f, MemberRole::Admin).await;
        f.svc.change_role(&f.admin, f.club_id, other, MemberRole::Officer).await.unwrap();
        f.svc.remove_member(&f.admin, f.club_id, other).await.unwrap();
        assert!(f.store.get_membership(f.club_id, other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let f = fixture(true).await;
        let officer_id = add_member(&f, MemberRole::Officer).await;
        let officer = Actor::new(officer_id, format!("{officer_id}@ucmerced.edu"));
        let member = add_member(&f, MemberRole::Member).await;
        let err = f.svc.remove_member(&officer, f.club_id, member).await.unwrap_err();
        assert!(matches!(err, BobcatsError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_non_admin_is_refused_before_target_lookup() {
        let f = fixture(true).await;
        let member_id = add_member(&f, MemberRole::Member).await;
        let member = Actor::new(member_id, format!("{member_id}@ucmerced.edu"));
        let missing = Uuid::new_v4();

        let err = f.svc.remove_member(&member, f.club_id, f.admin.user_id).await.unwrap_err();
        assert!(matches!(err, BobcatsError::Forbidden(_)));
        let err = f.svc.remove_member(&member, f.club_id, missing).await.unwrap_err();
        assert!(matches!(err, BobcatsError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_from_insert_maps_to_invite_message() {
        let store = Arc::new(MemoryClubStore::new());
        let club_id = store.add_club("Chess", true).await;
        let admin = Actor::new(Uuid::new_v4(), "admin@ucmerced.edu");
        store
            .insert_membership(&NewMembership {
                club_id,
                user_id: admin.user_id,
                email: admin.email.clone(),
                role: MemberRole::Admin,
            })
            .await
            .unwrap();
        store.hide_pending_invites(true).await;
        let svc = MembershipService::new(store.clone(), Arc::new(RecordingTrigger::new()));

        svc.invite(&admin, club_id, "new@ucmerced.edu", MemberRole::Member).await.unwrap();
        let err = svc.invite(&admin, club_id, "new@ucmerced.edu", MemberRole::Member).await.unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_INVITE);
        assert!(matches!(err, BobcatsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_deactivated_club_refuses_changes() {
        let f = fixture(false).await;
        let member = add_member(&f, MemberRole::Member).await;
        let err = f.svc.change_role(&f.admin, f.club_id, member, MemberRole::Officer).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot change roles while the club is deactivated.");
        let err = f.svc.invite(&f.admin, f.club_id, "x@ucmerced.edu", MemberRole::Member).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot invite members while the club is deactivated.");
    }

    #[tokio::test]
    async fn test_duplicate_pending_invite_rejected() {
        let f = fixture(true).await;
        f.svc.invite(&f.admin, f.club_id, " New@UCMerced.edu ", MemberRole::Member).await.unwrap();
        let err = f.svc.invite(&f.admin, f.club_id, "new@ucmerced.edu", MemberRole::Officer).await.unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_INVITE);
        assert!(matches!(err, BobcatsError::Conflict(_)));

        let pending = f.svc.pending_invites(&f.admin, f.club_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "new@ucmerced.edu");
    }

    #[tokio::test]
    async fn test_invite_fires_email_trigger() {
        let f = fixture(true).await;
        f.svc.invite(&f.admin, f.club_id, "new@ucmerced.edu", MemberRole::Member).await.unwrap();
        for _ in 0..50 {
            if f.trigger.calls() > 0 { break; }
            tokio::task::yield_now().await;
        }
        assert_eq!(f.trigger.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_invite_email() {
        let f = fixture(true).await;
        let err = f.svc.invite(&f.admin, f.club_id, "   ", MemberRole::Member).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter an email address.");
        let err = f.svc.invite(&f.admin, f.club_id, "nope@", MemberRole::Member).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
    }

    #[tokio::test]
    async fn test_accept_invite_creates_membership() {
        let f = fixture(true).await;
        let invite_id = f.svc.invite(&f.admin, f.club_id, "joiner@ucmerced.edu", MemberRole::Officer).await.unwrap();

        let stranger = Actor::new(Uuid::new_v4(), "someone@ucmerced.edu");
        assert!(matches!(f.svc.accept_invite(&stranger, invite_id).await, Err(BobcatsError::Forbidden(_))));

        let joiner = Actor::new(Uuid::new_v4(), "Joiner@ucmerced.edu");
        assert_eq!(f.svc.my_invites(&joiner).await.unwrap().len(), 1);
        assert_eq!(f.svc.accept_invite(&joiner, invite_id).await.unwrap(), f.club_id);

        let membership = f.store.get_membership(f.club_id, joiner.user_id).await.unwrap().unwrap();
        assert_eq!(membership.role, MemberRole::Officer);
        assert!(f.svc.my_invites(&joiner).await.unwrap().is_empty());
        assert!(f.svc.accept_invite(&joiner, invite_id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_members_defaults() {
        let f = fixture(true).await;
        for _ in 0..30 {
            add_member(&f, MemberRole::Member).await;
        }
        let page = f.svc.list_members(&f.admin, f.club_id, None, None).await.unwrap();
        assert_eq!(page.members.len(), DEFAULT_MEMBER_PAGE_SIZE as usize);
        assert_eq!(page.total, 31);
    }
}
