//! Membership service
//!
//! Every transition locks the clan, then the target player, then the
//! membership row, asks the policy engine, mutates, and recounts.

use tracing::{info, instrument};

use khan_core::entities::{Clan, Game, Membership, MembershipState, Player};
use khan_core::policy::{self, PolicyResult};
use khan_core::traits::{ClanRepository, Isolation, MembershipRepository, PlayerRepository, Transaction};
use khan_core::{DomainEvent, PolicyError};

use crate::dto::{
    ApplicationResponse, ApplyForMembershipRequest, EmptyResponse, InvitationReplyRequest,
    InviteForMembershipRequest, LevelResponse, MembershipActionRequest,
};
use crate::indexing::IndexJob;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::lookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelChange {
    Promote,
    Demote,
}

/// Rows loaded for a clan-side action on a player's membership
struct Target {
    game: Game,
    clan: Clan,
    requestor: Player,
    player: Player,
    membership: Membership,
    acting: Option<Membership>,
}

/// Membership service
pub struct MembershipService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MembershipService<'a> {
    /// Create a new MembershipService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Player applies to a clan. Clans with auto-join approve right away.
    #[instrument(skip(self, request))]
    pub async fn apply_for_membership(
        &self,
        game_id: &str,
        clan_id: &str,
        request: ApplyForMembershipRequest,
    ) -> ServiceResult<ApplicationResponse> {
        let now = self.ctx.now();
        let level = request.level.unwrap_or_default();
        let player_id = request.player_public_id.unwrap_or_default();

        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        policy::validate_level(&game, &level)?;
        let clan = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let player = lookup::locked_player(tx.as_mut(), game_id, &player_id).await?;
        let previous = tx.lock_membership(clan.id, player.id).await?;
        policy::may_apply(&game, &clan, &player, previous.as_ref(), now)?;

        let membership = open_request(
            tx.as_mut(),
            previous,
            Membership::pending(game_id, clan.id, player.id, player.id, &level, &request.message, now),
        )
        .await?;
        let mut events = vec![DomainEvent::membership_application_created(
            &clan,
            &player,
            &player,
            &membership,
        )];

        if !policy::auto_approve(&clan) {
            self.ctx.commit(tx, events, Vec::new()).await?;
            info!(game_id = %game_id, clan_id = %clan_id, player_id = %player_id, "Application created");
            return Ok(ApplicationResponse { approved: false });
        }

        let mut membership = membership;
        membership.approve(player.id, now);
        let membership = tx.update_membership(&membership).await?;
        let clan = tx.refresh_clan_counters(clan.id).await?;
        let player = tx.refresh_player_counters(player.id).await?;
        events.push(DomainEvent::membership_approved(
            &clan,
            &player,
            &player,
            &player,
            &membership,
        ));
        self.ctx
            .commit(tx, events, vec![IndexJob::upsert(&clan)])
            .await?;

        info!(game_id = %game_id, clan_id = %clan_id, player_id = %player_id, "Application auto-approved");
        Ok(ApplicationResponse { approved: true })
    }

    /// Clan owner or member invites a player
    #[instrument(skip(self, request))]
    pub async fn invite_for_membership(
        &self,
        game_id: &str,
        clan_id: &str,
        request: InviteForMembershipRequest,
    ) -> ServiceResult<EmptyResponse> {
        let now = self.ctx.now();
        let level = request.level.unwrap_or_default();
        let player_id = request.player_public_id.unwrap_or_default();
        let requestor_id = request.requestor_public_id.unwrap_or_default();

        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        policy::validate_level(&game, &level)?;
        let clan = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let requestor = lookup::player(tx.as_mut(), game_id, &requestor_id).await?;
        let player = lookup::locked_player(tx.as_mut(), game_id, &player_id).await?;
        if requestor.id == player.id {
            return Err(PolicyError::NotAuthorized.into());
        }
        let acting = lookup::acting_membership(tx.as_mut(), &clan, &requestor, player.id).await?;
        let actor = lookup::actor(&clan, requestor.id, acting.as_ref());

        let previous = tx.lock_membership(clan.id, player.id).await?;
        let mut pending_invites = tx.count_pending_invites(clan.id).await?;
        if previous
            .as_ref()
            .is_some_and(|m| m.state() == MembershipState::PendingInvite)
        {
            // refreshing an invite does not add one
            pending_invites -= 1;
        }
        policy::may_invite(
            &game,
            &clan,
            actor,
            &player,
            previous.as_ref(),
            pending_invites,
            now,
        )?;

        let membership = open_request(
            tx.as_mut(),
            previous,
            Membership::pending(game_id, clan.id, player.id, requestor.id, &level, &request.message, now),
        )
        .await?;
        let event =
            DomainEvent::membership_application_created(&clan, &player, &requestor, &membership);
        self.ctx.commit(tx, vec![event], Vec::new()).await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            player_id = %player_id,
            requestor_id = %requestor_id,
            "Invitation created"
        );
        Ok(EmptyResponse {})
    }

    /// Clan side approves a pending application
    pub async fn approve_application(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
    ) -> ServiceResult<EmptyResponse> {
        self.decide_application(game_id, clan_id, request, Decision::Approve)
            .await
    }

    /// Clan side denies a pending application
    pub async fn deny_application(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
    ) -> ServiceResult<EmptyResponse> {
        self.decide_application(game_id, clan_id, request, Decision::Deny)
            .await
    }

    /// Invitee accepts an invitation
    pub async fn approve_invitation(
        &self,
        game_id: &str,
        clan_id: &str,
        request: InvitationReplyRequest,
    ) -> ServiceResult<EmptyResponse> {
        self.decide_invitation(game_id, clan_id, request, Decision::Approve)
            .await
    }

    /// Invitee declines an invitation
    pub async fn deny_invitation(
        &self,
        game_id: &str,
        clan_id: &str,
        request: InvitationReplyRequest,
    ) -> ServiceResult<EmptyResponse> {
        self.decide_invitation(game_id, clan_id, request, Decision::Deny)
            .await
    }

    /// Move an approved member one level up; returns the new level
    pub async fn promote_member(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
    ) -> ServiceResult<LevelResponse> {
        self.change_level(game_id, clan_id, request, LevelChange::Promote)
            .await
    }

    /// Move an approved member one level down; returns the new level
    pub async fn demote_member(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
    ) -> ServiceResult<LevelResponse> {
        self.change_level(game_id, clan_id, request, LevelChange::Demote)
            .await
    }

    /// Kick a member, cancel a pending request, or leave the clan when the
    /// requestor is the player
    #[instrument(skip(self, request))]
    pub async fn delete_membership(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
    ) -> ServiceResult<EmptyResponse> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let Target {
            game,
            clan,
            requestor,
            player,
            mut membership,
            acting,
        } = load_target(tx.as_mut(), game_id, clan_id, &request).await?;
        let actor = lookup::actor(&clan, requestor.id, acting.as_ref());
        policy::may_remove(&game, actor, &membership)?;

        let was_approved = membership.is_approved();
        membership.soft_delete(requestor.id, now);
        let membership = tx.update_membership(&membership).await?;

        let (clan, player, jobs) = if was_approved {
            let clan = tx.refresh_clan_counters(clan.id).await?;
            let player = tx.refresh_player_counters(player.id).await?;
            let job = IndexJob::upsert(&clan);
            (clan, player, vec![job])
        } else {
            (clan, player, Vec::new())
        };

        let event = DomainEvent::membership_left(&clan, &player, &requestor, &membership);
        self.ctx.commit(tx, vec![event], jobs).await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            player_id = %player.public_id,
            requestor_id = %requestor.public_id,
            "Membership deleted"
        );
        Ok(EmptyResponse {})
    }

    #[instrument(skip(self, request))]
    async fn decide_application(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
        decision: Decision,
    ) -> ServiceResult<EmptyResponse> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let Target {
            game,
            clan,
            requestor,
            player,
            mut membership,
            acting,
        } = load_target(tx.as_mut(), game_id, clan_id, &request).await?;
        let actor = lookup::actor(&clan, requestor.id, acting.as_ref());
        policy::may_approve_application(&game, &membership, actor)?;

        let (event, jobs) = match decision {
            Decision::Approve => {
                policy::may_admit(&game, &clan, &player)?;
                membership.approve(requestor.id, now);
                let membership = tx.update_membership(&membership).await?;
                let clan = tx.refresh_clan_counters(clan.id).await?;
                let player = tx.refresh_player_counters(player.id).await?;
                let event = DomainEvent::membership_approved(
                    &clan,
                    &player,
                    &player,
                    &requestor,
                    &membership,
                );
                (event, vec![IndexJob::upsert(&clan)])
            }
            Decision::Deny => {
                membership.deny(requestor.id, now);
                let membership = tx.update_membership(&membership).await?;
                let event =
                    DomainEvent::membership_denied(&clan, &player, &player, &requestor, &membership);
                (event, Vec::new())
            }
        };
        self.ctx.commit(tx, vec![event], jobs).await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            player_id = %player.public_id,
            requestor_id = %requestor.public_id,
            decision = ?decision,
            "Application decided"
        );
        Ok(EmptyResponse {})
    }

    #[instrument(skip(self, request))]
    async fn decide_invitation(
        &self,
        game_id: &str,
        clan_id: &str,
        request: InvitationReplyRequest,
        decision: Decision,
    ) -> ServiceResult<EmptyResponse> {
        let now = self.ctx.now();
        let player_id = request.player_public_id.unwrap_or_default();

        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let clan = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let player = lookup::locked_player(tx.as_mut(), game_id, &player_id).await?;
        let mut membership = lookup::locked_membership(tx.as_mut(), &clan, &player).await?;
        policy::may_approve_invitation(&membership, player.id)?;
        let inviter = lookup::player_by_id(tx.as_mut(), membership.requestor_id).await?;

        let (event, jobs) = match decision {
            Decision::Approve => {
                policy::may_admit(&game, &clan, &player)?;
                membership.approve(player.id, now);
                let membership = tx.update_membership(&membership).await?;
                let clan = tx.refresh_clan_counters(clan.id).await?;
                let player = tx.refresh_player_counters(player.id).await?;
                let event = DomainEvent::membership_approved(
                    &clan,
                    &player,
                    &inviter,
                    &player,
                    &membership,
                );
                (event, vec![IndexJob::upsert(&clan)])
            }
            Decision::Deny => {
                membership.deny(player.id, now);
                let membership = tx.update_membership(&membership).await?;
                let event =
                    DomainEvent::membership_denied(&clan, &player, &inviter, &player, &membership);
                (event, Vec::new())
            }
        };
        self.ctx.commit(tx, vec![event], jobs).await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            player_id = %player_id,
            decision = ?decision,
            "Invitation decided"
        );
        Ok(EmptyResponse {})
    }

    #[instrument(skip(self, request))]
    async fn change_level(
        &self,
        game_id: &str,
        clan_id: &str,
        request: MembershipActionRequest,
        change: LevelChange,
    ) -> ServiceResult<LevelResponse> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let Target {
            game,
            clan,
            requestor,
            player,
            mut membership,
            acting,
        } = load_target(tx.as_mut(), game_id, clan_id, &request).await?;
        let actor = lookup::actor(&clan, requestor.id, acting.as_ref());

        let level: PolicyResult<String> = match change {
            LevelChange::Promote => policy::may_promote(&game, actor, &membership),
            LevelChange::Demote => policy::may_demote(&game, actor, &membership),
        };
        membership.level = level?;
        membership.updated_at = now;
        let membership = tx.update_membership(&membership).await?;

        let event = match change {
            LevelChange::Promote => {
                DomainEvent::membership_promoted(&clan, &player, &requestor, &membership)
            }
            LevelChange::Demote => {
                DomainEvent::membership_demoted(&clan, &player, &requestor, &membership)
            }
        };
        self.ctx.commit(tx, vec![event], Vec::new()).await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            player_id = %player.public_id,
            level = %membership.level,
            change = ?change,
            "Membership level changed"
        );
        Ok(LevelResponse {
            level: membership.level,
        })
    }
}

/// Load and lock the rows for a requestor acting on a player's membership
async fn load_target(
    tx: &mut dyn Transaction,
    game_id: &str,
    clan_id: &str,
    request: &MembershipActionRequest,
) -> ServiceResult<Target> {
    let player_id = request.player_public_id.as_deref().unwrap_or_default();
    let requestor_id = request.requestor_public_id.as_deref().unwrap_or_default();

    let game = lookup::game(tx, game_id).await?;
    let clan = lookup::locked_clan(tx, game_id, clan_id).await?;
    let requestor = lookup::player(tx, game_id, requestor_id).await?;
    let player = lookup::locked_player(tx, game_id, player_id).await?;
    let membership = lookup::locked_membership(tx, &clan, &player).await?;
    let acting = lookup::acting_membership(tx, &clan, &requestor, player.id).await?;

    Ok(Target {
        game,
        clan,
        requestor,
        player,
        membership,
        acting,
    })
}

/// Turn the pair's previous row into the new pending request, or insert
/// `fresh` when the pair has no row yet
async fn open_request(
    tx: &mut dyn Transaction,
    previous: Option<Membership>,
    fresh: Membership,
) -> ServiceResult<Membership> {
    match previous {
        Some(mut row) => {
            row.reopen(fresh.requestor_id, &fresh.level, &fresh.message, fresh.updated_at);
            Ok(tx.update_membership(&row).await?)
        }
        None => Ok(tx.insert_membership(&fresh).await?),
    }
}
