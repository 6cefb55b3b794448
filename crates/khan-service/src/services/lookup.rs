//! Row loading shared by the services
//!
//! Lookups of the entity named by the request path fail with
//! [`ServiceError::NotFound`]. Lookups of entities named in the body fail
//! with the domain not-found error.

use khan_core::entities::{Clan, Game, Membership, Player};
use khan_core::policy::Actor;
use khan_core::traits::{
    ClanRepository, GameRepository, MembershipRepository, PlayerRepository, Transaction,
};
use khan_core::{DomainError, EntityKind};

use super::error::{ServiceError, ServiceResult};

pub(crate) async fn game(tx: &mut dyn Transaction, game_id: &str) -> ServiceResult<Game> {
    tx.find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Game, game_id))
}

pub(crate) async fn clan(
    tx: &mut dyn Transaction,
    game_id: &str,
    clan_id: &str,
) -> ServiceResult<Clan> {
    tx.find_clan(game_id, clan_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Clan, clan_id))
}

pub(crate) async fn locked_clan(
    tx: &mut dyn Transaction,
    game_id: &str,
    clan_id: &str,
) -> ServiceResult<Clan> {
    tx.lock_clan(game_id, clan_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Clan, clan_id))
}

pub(crate) async fn player(
    tx: &mut dyn Transaction,
    game_id: &str,
    player_id: &str,
) -> ServiceResult<Player> {
    Ok(tx
        .find_player(game_id, player_id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Player, player_id))?)
}

pub(crate) async fn locked_player(
    tx: &mut dyn Transaction,
    game_id: &str,
    player_id: &str,
) -> ServiceResult<Player> {
    Ok(tx
        .lock_player(game_id, player_id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Player, player_id))?)
}

pub(crate) async fn player_by_id(tx: &mut dyn Transaction, id: i64) -> ServiceResult<Player> {
    Ok(tx
        .find_player_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Player, id))?)
}

/// Live membership of `player` in `clan`, row-locked
pub(crate) async fn locked_membership(
    tx: &mut dyn Transaction,
    clan: &Clan,
    player: &Player,
) -> ServiceResult<Membership> {
    Ok(tx
        .lock_membership(clan.id, player.id)
        .await?
        .filter(Membership::is_live)
        .ok_or_else(|| DomainError::not_found(EntityKind::Membership, &player.public_id))?)
}

/// Membership `requestor` acts through, when they are neither the clan
/// owner nor acting on their own row
pub(crate) async fn acting_membership(
    tx: &mut dyn Transaction,
    clan: &Clan,
    requestor: &Player,
    subject_id: i64,
) -> ServiceResult<Option<Membership>> {
    if clan.is_owner(requestor.id) || requestor.id == subject_id {
        return Ok(None);
    }
    let membership = tx
        .find_membership(clan.id, requestor.id)
        .await?
        .filter(Membership::is_live)
        .ok_or_else(|| DomainError::not_found(EntityKind::Membership, &requestor.public_id))?;
    Ok(Some(membership))
}

pub(crate) fn actor<'m>(
    clan: &Clan,
    requestor_id: i64,
    membership: Option<&'m Membership>,
) -> Actor<'m> {
    match membership {
        Some(membership) => Actor::Member(membership),
        None if clan.is_owner(requestor_id) => Actor::Owner,
        None => Actor::Subject,
    }
}
