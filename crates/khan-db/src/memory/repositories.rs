//! Repository implementations for [`MemoryTransaction`]
//!
//! Mirrors the PostgreSQL constraints: unique public ids per game, one live
//! membership per pair, unique hook subscriptions, and cascading membership
//! removal when a clan row is deleted.

use async_trait::async_trait;

use khan_core::entities::{Clan, Game, Hook, Membership, Player};
use khan_core::error::{DomainError, EntityKind};
use khan_core::events::EventType;
use khan_core::traits::{
    ClanRepository, GameRepository, HookRepository, MembershipRepository, PlayerRepository,
    RepoResult,
};
use khan_core::value_objects::{PruneCounts, PruneOptions};

use super::MemoryTransaction;

fn duplicate(kind: &str, public_id: &str) -> DomainError {
    DomainError::IntegrityError(format!("{kind} with publicID {public_id} already exists"))
}

/// Live row first, then the most recently touched one
fn latest_for_pair<'a>(
    rows: impl Iterator<Item = &'a Membership>,
    clan_id: i64,
    player_id: i64,
) -> Option<Membership> {
    rows.filter(|m| m.clan_id == clan_id && m.player_id == player_id)
        .max_by_key(|m| (m.is_live(), m.updated_at, m.id))
        .cloned()
}

// ============================================================================
// Games
// ============================================================================

#[async_trait]
impl GameRepository for MemoryTransaction {
    async fn find_game(&mut self, public_id: &str) -> RepoResult<Option<Game>> {
        Ok(self
            .work
            .games
            .values()
            .find(|g| g.public_id == public_id)
            .cloned())
    }

    async fn list_games(&mut self) -> RepoResult<Vec<Game>> {
        Ok(self.work.games.values().cloned().collect())
    }

    async fn insert_game(&mut self, game: &Game) -> RepoResult<Game> {
        if self.work.games.values().any(|g| g.public_id == game.public_id) {
            return Err(duplicate("Game", &game.public_id));
        }
        let mut stored = game.clone();
        stored.id = self.work.next_id();
        self.work.games.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_game(&mut self, game: &Game) -> RepoResult<Game> {
        let stored = self
            .work
            .games
            .values_mut()
            .find(|g| g.public_id == game.public_id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Game, &game.public_id))?;
        let id = stored.id;
        let created_at = stored.created_at;
        *stored = Game {
            id,
            created_at,
            ..game.clone()
        };
        Ok(stored.clone())
    }
}

// ============================================================================
// Players
// ============================================================================

#[async_trait]
impl PlayerRepository for MemoryTransaction {
    async fn find_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>> {
        Ok(self
            .work
            .players
            .values()
            .find(|p| p.game_id == game_id && p.public_id == public_id)
            .cloned())
    }

    async fn lock_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>> {
        self.find_player(game_id, public_id).await
    }

    async fn find_player_by_id(&mut self, id: i64) -> RepoResult<Option<Player>> {
        Ok(self.work.players.get(&id).cloned())
    }

    async fn find_players_by_ids(&mut self, ids: &[i64]) -> RepoResult<Vec<Player>> {
        Ok(self
            .work
            .players
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_player(&mut self, player: &Player) -> RepoResult<Player> {
        if self
            .work
            .players
            .values()
            .any(|p| p.game_id == player.game_id && p.public_id == player.public_id)
        {
            return Err(duplicate("Player", &player.public_id));
        }
        let mut stored = player.clone();
        stored.id = self.work.next_id();
        stored.membership_count = 0;
        stored.ownership_count = 0;
        self.work.players.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_player(&mut self, player: &Player) -> RepoResult<Player> {
        let stored = self
            .work
            .players
            .get_mut(&player.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Player, &player.public_id))?;
        stored.name.clone_from(&player.name);
        stored.metadata.clone_from(&player.metadata);
        stored.updated_at = player.updated_at;
        Ok(stored.clone())
    }

    async fn refresh_player_counters(&mut self, player_id: i64) -> RepoResult<Player> {
        let approved = self
            .work
            .memberships
            .values()
            .filter(|m| m.player_id == player_id && m.approved && m.is_live())
            .count();
        let owned = self
            .work
            .clans
            .values()
            .filter(|c| c.owner_id == player_id)
            .count();

        let stored = self
            .work
            .players
            .get_mut(&player_id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Player, player_id))?;
        stored.membership_count = i32::try_from(approved).unwrap_or(i32::MAX);
        stored.ownership_count = i32::try_from(owned).unwrap_or(i32::MAX);
        Ok(stored.clone())
    }
}

// ============================================================================
// Clans
// ============================================================================

#[async_trait]
impl ClanRepository for MemoryTransaction {
    async fn find_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>> {
        Ok(self
            .work
            .clans
            .values()
            .find(|c| c.game_id == game_id && c.public_id == public_id)
            .cloned())
    }

    async fn lock_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>> {
        self.find_clan(game_id, public_id).await
    }

    async fn find_clan_by_id(&mut self, id: i64) -> RepoResult<Option<Clan>> {
        Ok(self.work.clans.get(&id).cloned())
    }

    async fn list_clans(&mut self, game_id: &str) -> RepoResult<Vec<Clan>> {
        let mut clans: Vec<Clan> = self
            .work
            .clans
            .values()
            .filter(|c| c.game_id == game_id)
            .cloned()
            .collect();
        clans.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(clans)
    }

    async fn find_clans(&mut self, game_id: &str, public_ids: &[String]) -> RepoResult<Vec<Clan>> {
        Ok(self
            .work
            .clans
            .values()
            .filter(|c| c.game_id == game_id && public_ids.contains(&c.public_id))
            .cloned()
            .collect())
    }

    async fn insert_clan(&mut self, clan: &Clan) -> RepoResult<Clan> {
        if self
            .work
            .clans
            .values()
            .any(|c| c.game_id == clan.game_id && c.public_id == clan.public_id)
        {
            return Err(duplicate("Clan", &clan.public_id));
        }
        let mut stored = clan.clone();
        stored.id = self.work.next_id();
        stored.membership_count = 1;
        self.work.clans.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_clan(&mut self, clan: &Clan) -> RepoResult<Clan> {
        let stored = self
            .work
            .clans
            .get_mut(&clan.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Clan, &clan.public_id))?;
        stored.name.clone_from(&clan.name);
        stored.metadata.clone_from(&clan.metadata);
        stored.allow_application = clan.allow_application;
        stored.auto_join = clan.auto_join;
        stored.owner_id = clan.owner_id;
        stored.updated_at = clan.updated_at;
        Ok(stored.clone())
    }

    async fn delete_clan(&mut self, id: i64) -> RepoResult<()> {
        self.work.clans.remove(&id);
        self.work.memberships.retain(|_, m| m.clan_id != id);
        Ok(())
    }

    async fn refresh_clan_counters(&mut self, clan_id: i64) -> RepoResult<Clan> {
        let approved = self
            .work
            .memberships
            .values()
            .filter(|m| m.clan_id == clan_id && m.approved && m.is_live())
            .count();

        let stored = self
            .work
            .clans
            .get_mut(&clan_id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Clan, clan_id))?;
        stored.membership_count = 1 + i32::try_from(approved).unwrap_or(i32::MAX - 1);
        Ok(stored.clone())
    }
}

// ============================================================================
// Memberships
// ============================================================================

impl MemoryTransaction {
    fn live_pair_taken(&self, membership: &Membership) -> bool {
        membership.is_live()
            && self.work.memberships.values().any(|m| {
                m.id != membership.id
                    && m.is_live()
                    && m.clan_id == membership.clan_id
                    && m.player_id == membership.player_id
            })
    }

    fn prune_where<F>(&mut self, game_id: &str, cutoff: i64, matches: F) -> u64
    where
        F: Fn(&Membership) -> bool,
    {
        let before = self.work.memberships.len();
        self.work
            .memberships
            .retain(|_, m| !(m.game_id == game_id && m.updated_at < cutoff && matches(m)));
        (before - self.work.memberships.len()) as u64
    }
}

fn live_pair_conflict(membership: &Membership) -> DomainError {
    DomainError::IntegrityError(format!(
        "player {} already has a live membership in clan {}",
        membership.player_id, membership.clan_id
    ))
}

fn is_pending(m: &Membership) -> bool {
    m.is_live() && !m.approved && !m.denied
}

#[async_trait]
impl MembershipRepository for MemoryTransaction {
    async fn find_membership(
        &mut self,
        clan_id: i64,
        player_id: i64,
    ) -> RepoResult<Option<Membership>> {
        Ok(latest_for_pair(
            self.work.memberships.values(),
            clan_id,
            player_id,
        ))
    }

    async fn lock_membership(
        &mut self,
        clan_id: i64,
        player_id: i64,
    ) -> RepoResult<Option<Membership>> {
        self.find_membership(clan_id, player_id).await
    }

    async fn clan_memberships(&mut self, clan_id: i64) -> RepoResult<Vec<Membership>> {
        let mut rows: Vec<Membership> = self
            .work
            .memberships
            .values()
            .filter(|m| m.clan_id == clan_id && m.is_live())
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn player_memberships(&mut self, player_id: i64) -> RepoResult<Vec<Membership>> {
        let mut rows: Vec<Membership> = self
            .work
            .memberships
            .values()
            .filter(|m| m.player_id == player_id && m.is_live())
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn count_pending_invites(&mut self, clan_id: i64) -> RepoResult<i64> {
        let count = self
            .work
            .memberships
            .values()
            .filter(|m| {
                m.clan_id == clan_id && is_pending(m) && !m.banned && m.requestor_id != m.player_id
            })
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn insert_membership(&mut self, membership: &Membership) -> RepoResult<Membership> {
        if self.live_pair_taken(membership) {
            return Err(live_pair_conflict(membership));
        }
        let mut stored = membership.clone();
        stored.id = self.work.next_id();
        self.work.memberships.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_membership(&mut self, membership: &Membership) -> RepoResult<Membership> {
        if self.live_pair_taken(membership) {
            return Err(live_pair_conflict(membership));
        }
        let stored = self
            .work
            .memberships
            .get_mut(&membership.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Membership, membership.id))?;
        let created_at = stored.created_at;
        *stored = Membership {
            created_at,
            ..membership.clone()
        };
        Ok(stored.clone())
    }

    async fn prune_memberships(
        &mut self,
        game_id: &str,
        options: &PruneOptions,
        now: i64,
    ) -> RepoResult<PruneCounts> {
        let cutoff = |ttl_secs: i64| PruneOptions::cutoff(now, ttl_secs);

        Ok(PruneCounts {
            pending_applications_pruned: self
                .prune_where(game_id, cutoff(options.pending_applications), |m| {
                    is_pending(m) && m.requestor_id == m.player_id
                }),
            pending_invites_pruned: self
                .prune_where(game_id, cutoff(options.pending_invites), |m| {
                    is_pending(m) && m.requestor_id != m.player_id
                }),
            denied_memberships_pruned: self
                .prune_where(game_id, cutoff(options.denied_memberships), |m| m.denied),
            deleted_memberships_pruned: self
                .prune_where(game_id, cutoff(options.deleted_memberships), |m| {
                    !m.is_live()
                }),
        })
    }
}

// ============================================================================
// Hooks
// ============================================================================

#[async_trait]
impl HookRepository for MemoryTransaction {
    async fn list_hooks(&mut self) -> RepoResult<Vec<Hook>> {
        Ok(self.work.hooks.values().cloned().collect())
    }

    async fn game_hooks(&mut self, game_id: &str) -> RepoResult<Vec<Hook>> {
        Ok(self
            .work
            .hooks
            .values()
            .filter(|h| h.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn find_hook(
        &mut self,
        game_id: &str,
        event_type: EventType,
        url: &str,
    ) -> RepoResult<Option<Hook>> {
        Ok(self
            .work
            .hooks
            .values()
            .find(|h| h.matches(game_id, event_type) && h.url == url)
            .cloned())
    }

    async fn insert_hook(&mut self, hook: &Hook) -> RepoResult<Hook> {
        let taken = self.work.hooks.values().any(|h| {
            h.game_id == hook.game_id
                && (h.public_id == hook.public_id
                    || (h.event_type == hook.event_type && h.url == hook.url))
        });
        if taken {
            return Err(duplicate("Hook", &hook.public_id));
        }
        let mut stored = hook.clone();
        stored.id = self.work.next_id();
        self.work.hooks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_hook(&mut self, game_id: &str, public_id: &str) -> RepoResult<bool> {
        let before = self.work.hooks.len();
        self.work
            .hooks
            .retain(|_, h| !(h.game_id == game_id && h.public_id == public_id));
        Ok(self.work.hooks.len() < before)
    }
}
