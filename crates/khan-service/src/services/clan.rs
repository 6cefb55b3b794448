//! Clan service
//!
//! Clan lifecycle: creation, updates, reads, owner leave with succession,
//! and ownership transfer. Every mutation queues a search index job that is
//! applied after commit.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use khan_cache::summary_key;
use khan_core::entities::{Clan, Membership, MembershipState, Player};
use khan_core::events::should_notify_clan_update;
use khan_core::policy;
use khan_core::traits::{
    ClanRepository, Isolation, MembershipRepository, PlayerRepository, Transaction,
};
use khan_core::{DomainEvent, PolicyError};

use crate::dto::{
    ClanDetailsResponse, ClanListResponse, ClanRoster, ClanSummaryResponse, CreateClanRequest,
    CreatedResponse, EmptyResponse, LeaveClanResponse, PlayerSummary, RosterEntry,
    TransferOwnershipRequest, TransferOwnershipResponse, UpdateClanRequest,
};
use crate::indexing::IndexJob;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::lookup;

/// Clan service
pub struct ClanService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ClanService<'a> {
    /// Create a new ClanService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a clan owned by `ownerPublicID`
    #[instrument(skip(self, request))]
    pub async fn create_clan(
        &self,
        game_id: &str,
        request: CreateClanRequest,
    ) -> ServiceResult<CreatedResponse> {
        let now = self.ctx.now();
        let owner_id = request.owner_public_id.unwrap_or_default();

        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let owner = lookup::locked_player(tx.as_mut(), game_id, &owner_id).await?;
        policy::may_create_clan(&game, &owner)?;

        let clan = Clan {
            id: 0,
            game_id: game_id.to_string(),
            public_id: request.public_id.unwrap_or_default(),
            name: request.name.unwrap_or_default(),
            metadata: request.metadata,
            allow_application: request.allow_application.unwrap_or_default(),
            auto_join: request.auto_join.unwrap_or_default(),
            membership_count: 1,
            owner_id: owner.id,
            created_at: now,
            updated_at: now,
        };
        let clan = tx.insert_clan(&clan).await?;
        let owner = tx.refresh_player_counters(owner.id).await?;

        let event = DomainEvent::clan_created(&clan, &owner);
        let job = IndexJob::upsert(&clan);
        self.ctx.commit(tx, vec![event], vec![job]).await?;

        info!(game_id = %game_id, clan_id = %clan.public_id, owner_id = %owner.public_id, "Clan created");
        Ok(CreatedResponse {
            public_id: clan.public_id,
        })
    }

    /// Update a clan; `ownerPublicID` must name the current owner.
    ///
    /// `clan_updated` fires only when the game's whitelist allows.
    #[instrument(skip(self, request))]
    pub async fn update_clan(
        &self,
        game_id: &str,
        clan_id: &str,
        request: UpdateClanRequest,
    ) -> ServiceResult<EmptyResponse> {
        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let existing = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let owner = lookup::player_by_id(tx.as_mut(), existing.owner_id).await?;
        if request.owner_public_id.as_deref() != Some(owner.public_id.as_str()) {
            return Err(PolicyError::NotAuthorized.into());
        }

        let mut clan = existing.clone();
        clan.name = request.name.unwrap_or_default();
        clan.metadata = request.metadata;
        clan.allow_application = request
            .allow_application
            .unwrap_or(existing.allow_application);
        clan.auto_join = request.auto_join.unwrap_or(existing.auto_join);
        clan.updated_at = self.ctx.now();
        let clan = tx.update_clan(&clan).await?;

        let mut events = Vec::new();
        if should_notify_clan_update(&game.clan_whitelist(), &existing, &clan) {
            events.push(DomainEvent::clan_updated(&clan, &owner));
        } else {
            debug!(clan_id = %clan_id, "Clan update outside hook whitelist");
        }
        self.ctx
            .commit(tx, events, vec![IndexJob::upsert(&clan)])
            .await?;

        info!(game_id = %game_id, clan_id = %clan_id, "Clan updated");
        Ok(EmptyResponse {})
    }

    /// Every clan of a game
    #[instrument(skip(self))]
    pub async fn list_clans(&self, game_id: &str) -> ServiceResult<ClanListResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;
        let clans = tx.list_clans(game_id).await?;
        tx.rollback().await?;

        Ok(ClanListResponse {
            clans: clans.iter().map(ClanSummaryResponse::from).collect(),
        })
    }

    /// Clan with its owner and roster grouped by membership state
    #[instrument(skip(self))]
    pub async fn get_clan(&self, game_id: &str, clan_id: &str) -> ServiceResult<ClanDetailsResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let clan = lookup::clan(tx.as_mut(), game_id, clan_id).await?;
        let owner = lookup::player_by_id(tx.as_mut(), clan.owner_id).await?;
        let memberships = tx.clan_memberships(clan.id).await?;

        let mut ids: Vec<i64> = memberships
            .iter()
            .flat_map(|m| [m.player_id, m.requestor_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let players: HashMap<i64, Player> = tx
            .find_players_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        tx.rollback().await?;

        let roster = build_roster(&memberships, &players);
        Ok(ClanDetailsResponse {
            clan: ClanSummaryResponse::from(&clan),
            owner: PlayerSummary::from(&owner),
            roster,
        })
    }

    /// Summary fields of one clan
    #[instrument(skip(self))]
    pub async fn get_clan_summary(
        &self,
        game_id: &str,
        clan_id: &str,
    ) -> ServiceResult<ClanSummaryResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let clan = lookup::clan(tx.as_mut(), game_id, clan_id).await?;
        tx.rollback().await?;
        Ok(ClanSummaryResponse::from(&clan))
    }

    /// Summaries of the listed clans that exist, served from the TTL cache
    /// when possible
    #[instrument(skip(self, clan_ids), fields(count = clan_ids.len()))]
    pub async fn get_clan_summaries(
        &self,
        game_id: &str,
        clan_ids: &[String],
    ) -> ServiceResult<ClanListResponse> {
        let key = summary_key(game_id, clan_ids);
        if let Some(clans) = self.ctx.summaries().get(&key) {
            debug!(game_id = %game_id, "Clan summaries served from cache");
            return Ok(ClanListResponse { clans });
        }

        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;
        let found = tx.find_clans(game_id, clan_ids).await?;
        tx.rollback().await?;

        let clans: Vec<ClanSummaryResponse> =
            found.iter().map(ClanSummaryResponse::from).collect();
        if clans.len() < clan_ids.len() {
            debug!(
                game_id = %game_id,
                requested = clan_ids.len(),
                found = clans.len(),
                "Some clan summaries were not found"
            );
        }
        self.ctx.summaries().insert(key, clans.clone());
        Ok(ClanListResponse { clans })
    }

    /// Text search over clan names in the search index
    #[instrument(skip(self))]
    pub async fn search_clans(&self, game_id: &str, term: &str) -> ServiceResult<ClanListResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;
        tx.rollback().await?;

        let documents = self
            .ctx
            .search_index()
            .search(game_id, term, self.ctx.max_search_results())
            .await?;
        Ok(ClanListResponse {
            clans: documents.iter().map(ClanSummaryResponse::from).collect(),
        })
    }

    /// Owner leaves the clan.
    ///
    /// The highest-level, earliest-joined member takes over. With no
    /// approved member left the clan is deleted.
    #[instrument(skip(self))]
    pub async fn leave_clan(&self, game_id: &str, clan_id: &str) -> ServiceResult<LeaveClanResponse> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let mut clan = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let previous_owner_id = clan.owner_id;
        let memberships = tx.clan_memberships(clan.id).await?;

        let Some(successor) = policy::choose_successor(&game, &memberships).cloned() else {
            for membership in memberships.iter().filter(|m| m.is_live()) {
                let mut membership = membership.clone();
                membership.soft_delete(previous_owner_id, now);
                tx.update_membership(&membership).await?;
            }
            tx.delete_clan(clan.id).await?;

            let previous_owner = tx.refresh_player_counters(previous_owner_id).await?;
            refresh_members(tx.as_mut(), &memberships).await?;

            let event = DomainEvent::clan_left(&clan, &previous_owner, None);
            let job = IndexJob::delete(game_id, clan.id);
            self.ctx.commit(tx, vec![event], vec![job]).await?;

            info!(game_id = %game_id, clan_id = %clan_id, "Owner left, clan deleted");
            return Ok(LeaveClanResponse {
                previous_owner: PlayerSummary::from(&previous_owner),
                new_owner: None,
                is_deleted: true,
            });
        };

        let mut promoted = successor.clone();
        promoted.soft_delete(previous_owner_id, now);
        tx.update_membership(&promoted).await?;

        clan.owner_id = successor.player_id;
        clan.updated_at = now;
        tx.update_clan(&clan).await?;
        let clan = tx.refresh_clan_counters(clan.id).await?;
        let previous_owner = tx.refresh_player_counters(previous_owner_id).await?;
        let new_owner = tx.refresh_player_counters(successor.player_id).await?;

        let events = vec![
            DomainEvent::clan_left(&clan, &previous_owner, Some(&new_owner)),
            DomainEvent::clan_ownership_transferred(&clan, &previous_owner, &new_owner),
        ];
        self.ctx
            .commit(tx, events, vec![IndexJob::upsert(&clan)])
            .await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            new_owner = %new_owner.public_id,
            "Owner left, ownership passed on"
        );
        Ok(LeaveClanResponse {
            previous_owner: PlayerSummary::from(&previous_owner),
            new_owner: Some(PlayerSummary::from(&new_owner)),
            is_deleted: false,
        })
    }

    /// Hand the clan to an approved member; the previous owner stays as a
    /// member at the top level
    #[instrument(skip(self, request))]
    pub async fn transfer_ownership(
        &self,
        game_id: &str,
        clan_id: &str,
        request: TransferOwnershipRequest,
    ) -> ServiceResult<TransferOwnershipResponse> {
        let now = self.ctx.now();
        let new_owner_id = request.player_public_id.unwrap_or_default();

        let mut tx = self.ctx.begin(Isolation::Serializable).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let mut clan = lookup::locked_clan(tx.as_mut(), game_id, clan_id).await?;
        let previous_owner = lookup::player_by_id(tx.as_mut(), clan.owner_id).await?;
        let new_owner = lookup::locked_player(tx.as_mut(), game_id, &new_owner_id).await?;
        if new_owner.id == previous_owner.id {
            return Err(ServiceError::validation("player already owns this clan"));
        }

        let mut membership = lookup::locked_membership(tx.as_mut(), &clan, &new_owner).await?;
        if !membership.is_approved() {
            return Err(PolicyError::NotAuthorized.into());
        }
        membership.soft_delete(previous_owner.id, now);
        tx.update_membership(&membership).await?;

        let top = game
            .membership_levels
            .top()
            .ok_or_else(|| ServiceError::internal("game has no membership levels"))?
            .to_string();
        match tx.lock_membership(clan.id, previous_owner.id).await? {
            Some(mut row) => {
                row.restore_approved(&top, new_owner.id, now);
                tx.update_membership(&row).await?;
            }
            None => {
                let mut row = Membership::pending(
                    game_id,
                    clan.id,
                    previous_owner.id,
                    previous_owner.id,
                    &top,
                    "",
                    now,
                );
                row.approve(new_owner.id, now);
                tx.insert_membership(&row).await?;
            }
        }

        clan.owner_id = new_owner.id;
        clan.updated_at = now;
        tx.update_clan(&clan).await?;
        let clan = tx.refresh_clan_counters(clan.id).await?;
        let previous_owner = tx.refresh_player_counters(previous_owner.id).await?;
        let new_owner = tx.refresh_player_counters(new_owner.id).await?;

        let event = DomainEvent::clan_ownership_transferred(&clan, &previous_owner, &new_owner);
        self.ctx
            .commit(tx, vec![event], vec![IndexJob::upsert(&clan)])
            .await?;

        info!(
            game_id = %game_id,
            clan_id = %clan_id,
            new_owner = %new_owner.public_id,
            "Clan ownership transferred"
        );
        Ok(TransferOwnershipResponse {
            previous_owner: PlayerSummary::from(&previous_owner),
            new_owner: PlayerSummary::from(&new_owner),
        })
    }
}

/// Recount every player that held an approved row in `memberships`
async fn refresh_members(tx: &mut dyn Transaction, memberships: &[Membership]) -> ServiceResult<()> {
    for membership in memberships.iter().filter(|m| m.is_approved()) {
        tx.refresh_player_counters(membership.player_id).await?;
    }
    Ok(())
}

fn build_roster(memberships: &[Membership], players: &HashMap<i64, Player>) -> ClanRoster {
    let mut roster = ClanRoster::default();
    for membership in memberships {
        let Some(player) = players.get(&membership.player_id) else {
            continue;
        };
        let requestor = players.get(&membership.requestor_id);
        let bucket = match membership.state() {
            MembershipState::Approved => &mut roster.members,
            MembershipState::PendingApplication => &mut roster.pending_applications,
            MembershipState::PendingInvite => &mut roster.pending_invites,
            MembershipState::Denied => &mut roster.denied,
            MembershipState::Banned => &mut roster.banned,
            MembershipState::Deleted => continue,
        };
        bucket.push(RosterEntry::new(membership, player, requestor));
    }
    roster
}

#[cfg(test)]
mod tests {
    use khan_core::value_objects::Metadata;

    use super::*;

    fn player(id: i64, public_id: &str) -> Player {
        let mut player = Player::new("g1", public_id, public_id, Metadata::new(), 0);
        player.id = id;
        player
    }

    #[test]
    fn test_build_roster_groups_by_state() {
        let players: HashMap<i64, Player> = [(1, player(1, "p1")), (2, player(2, "p2")), (3, player(3, "p3"))]
            .into_iter()
            .collect();

        let mut member = Membership::pending("g1", 9, 1, 1, "Member", "", 1);
        member.approve(9, 2);
        let application = Membership::pending("g1", 9, 2, 2, "Member", "hi", 1);
        let invite = Membership::pending("g1", 9, 3, 1, "Member", "", 1);
        let mut gone = Membership::pending("g1", 9, 4, 4, "Member", "", 1);
        gone.soft_delete(4, 5);

        let roster = build_roster(&[member, application, invite, gone], &players);
        assert_eq!(roster.members.len(), 1);
        assert_eq!(roster.pending_applications[0].player.public_id, "p2");
        assert_eq!(
            roster.pending_invites[0].requestor_public_id.as_deref(),
            Some("p1")
        );
        assert!(roster.denied.is_empty());
    }
}
