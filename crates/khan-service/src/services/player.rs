//! Player service
//!
//! Handles player creation, updates, and the player view with the
//! player's memberships.

use std::collections::HashMap;

use tracing::{info, instrument};

use khan_core::entities::{MembershipState, Player};
use khan_core::events::should_notify_player_update;
use khan_core::traits::{
    ClanRepository, Isolation, MembershipRepository, PlayerRepository,
};
use khan_core::{DomainEvent, EntityKind};

use crate::dto::{
    ClanSummaryResponse, CreatePlayerRequest, PlayerClansDigest, PlayerDetailsResponse,
    PlayerMembershipResponse, PlayerResponse, UpdatePlayerRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::lookup;

/// Player service
pub struct PlayerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PlayerService<'a> {
    /// Create a new PlayerService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a player
    #[instrument(skip(self, request))]
    pub async fn create_player(
        &self,
        game_id: &str,
        request: CreatePlayerRequest,
    ) -> ServiceResult<PlayerResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;

        let player = Player::new(
            game_id,
            request.public_id.unwrap_or_default(),
            request.name.unwrap_or_default(),
            request.metadata,
            self.ctx.now(),
        );
        let player = tx.insert_player(&player).await?;
        let event = DomainEvent::player_created(&player);
        self.ctx.commit(tx, vec![event], Vec::new()).await?;

        info!(game_id = %game_id, player_id = %player.public_id, "Player created");
        Ok(PlayerResponse::from(&player))
    }

    /// Update the player at `player_id`, creating it when absent.
    ///
    /// Updates emit `player_updated` only when the game's whitelist allows.
    #[instrument(skip(self, request))]
    pub async fn upsert_player(
        &self,
        game_id: &str,
        player_id: &str,
        request: UpdatePlayerRequest,
    ) -> ServiceResult<PlayerResponse> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let game = lookup::game(tx.as_mut(), game_id).await?;
        let name = request.name.unwrap_or_default();

        let Some(existing) = tx.lock_player(game_id, player_id).await? else {
            let player = Player::new(game_id, player_id, name, request.metadata, now);
            let player = tx.insert_player(&player).await?;
            let event = DomainEvent::player_created(&player);
            self.ctx.commit(tx, vec![event], Vec::new()).await?;
            info!(game_id = %game_id, player_id = %player_id, "Player created on update");
            return Ok(PlayerResponse::from(&player));
        };

        let mut player = existing.clone();
        player.name = name;
        player.metadata = request.metadata;
        player.updated_at = now;
        let player = tx.update_player(&player).await?;

        let mut events = Vec::new();
        if should_notify_player_update(&game.player_whitelist(), &existing, &player) {
            events.push(DomainEvent::player_updated(&player));
        }
        self.ctx.commit(tx, events, Vec::new()).await?;

        info!(game_id = %game_id, player_id = %player_id, "Player updated");
        Ok(PlayerResponse::from(&player))
    }

    /// Player with counters, a digest of clans by relation, and every live
    /// membership
    #[instrument(skip(self))]
    pub async fn get_player(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> ServiceResult<PlayerDetailsResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let player = tx
            .find_player(game_id, player_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Player, player_id))?;

        let memberships = tx.player_memberships(player.id).await?;
        let owned: Vec<String> = tx
            .list_clans(game_id)
            .await?
            .into_iter()
            .filter(|clan| clan.is_owner(player.id))
            .map(|clan| clan.public_id)
            .collect();

        let mut related_ids: Vec<i64> = memberships
            .iter()
            .flat_map(|m| [Some(m.requestor_id), m.approver_id, m.denier_id])
            .flatten()
            .collect();
        related_ids.sort_unstable();
        related_ids.dedup();
        let related: HashMap<i64, Player> = tx
            .find_players_by_ids(&related_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let public_id = |id: Option<i64>| {
            id.and_then(|id| related.get(&id))
                .map(|p| p.public_id.clone())
        };

        let mut clans = PlayerClansDigest {
            owned,
            ..PlayerClansDigest::default()
        };
        let mut views = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            let Some(clan) = tx.find_clan_by_id(membership.clan_id).await? else {
                continue;
            };
            let state = membership.state();
            let bucket = match state {
                MembershipState::Approved => &mut clans.approved,
                MembershipState::PendingApplication => &mut clans.pending_applications,
                MembershipState::PendingInvite => &mut clans.pending_invites,
                MembershipState::Denied => &mut clans.denied,
                MembershipState::Banned => &mut clans.banned,
                MembershipState::Deleted => continue,
            };
            bucket.push(clan.public_id.clone());

            views.push(PlayerMembershipResponse {
                level: membership.level.clone(),
                state,
                message: membership.message.clone(),
                clan: ClanSummaryResponse::from(&clan),
                requestor_public_id: public_id(Some(membership.requestor_id)),
                approver_public_id: public_id(membership.approver_id),
                denier_public_id: public_id(membership.denier_id),
                created_at: membership.created_at,
                updated_at: membership.updated_at,
                approved_at: membership.approved_at,
                denied_at: membership.denied_at,
            });
        }
        tx.rollback().await?;

        Ok(PlayerDetailsResponse {
            player: PlayerResponse::from(&player),
            created_at: player.created_at,
            updated_at: player.updated_at,
            clans,
            memberships: views,
        })
    }
}
