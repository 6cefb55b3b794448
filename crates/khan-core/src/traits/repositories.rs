//! Repository traits (ports) - define the interface for data access
//!
//! All access goes through a [`Transaction`] obtained from a [`Store`]. The
//! per-entity traits are supertraits of `Transaction`, so a single boxed
//! transaction exposes every repository. Methods named `lock_*` take a row
//! lock that is held until commit or rollback; callers acquire them in the
//! order Clan, Player, Membership.

use async_trait::async_trait;

use crate::entities::{Clan, Game, Hook, Membership, Player};
use crate::error::DomainError;
use crate::events::EventType;
use crate::value_objects::{PruneCounts, PruneOptions};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Isolation level requested when a transaction begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadCommitted,
    Serializable,
}

// ============================================================================
// Game Repository
// ============================================================================

#[async_trait]
pub trait GameRepository: Send {
    /// Find game by public ID
    async fn find_game(&mut self, public_id: &str) -> RepoResult<Option<Game>>;

    async fn list_games(&mut self) -> RepoResult<Vec<Game>>;

    /// Insert a new game, returning it with its surrogate id
    async fn insert_game(&mut self, game: &Game) -> RepoResult<Game>;

    async fn update_game(&mut self, game: &Game) -> RepoResult<Game>;
}

// ============================================================================
// Player Repository
// ============================================================================

#[async_trait]
pub trait PlayerRepository: Send {
    async fn find_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>>;

    /// Find and row-lock a player
    async fn lock_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>>;

    async fn find_player_by_id(&mut self, id: i64) -> RepoResult<Option<Player>>;

    async fn find_players_by_ids(&mut self, ids: &[i64]) -> RepoResult<Vec<Player>>;

    async fn insert_player(&mut self, player: &Player) -> RepoResult<Player>;

    async fn update_player(&mut self, player: &Player) -> RepoResult<Player>;

    /// Recompute `membership_count` and `ownership_count` from primary rows
    async fn refresh_player_counters(&mut self, player_id: i64) -> RepoResult<Player>;
}

// ============================================================================
// Clan Repository
// ============================================================================

#[async_trait]
pub trait ClanRepository: Send {
    async fn find_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>>;

    /// Find and row-lock a clan
    async fn lock_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>>;

    async fn find_clan_by_id(&mut self, id: i64) -> RepoResult<Option<Clan>>;

    /// All clans of a game, ordered by name
    async fn list_clans(&mut self, game_id: &str) -> RepoResult<Vec<Clan>>;

    /// Clans matching any of the public ids; unknown ids are skipped
    async fn find_clans(&mut self, game_id: &str, public_ids: &[String]) -> RepoResult<Vec<Clan>>;

    async fn insert_clan(&mut self, clan: &Clan) -> RepoResult<Clan>;

    async fn update_clan(&mut self, clan: &Clan) -> RepoResult<Clan>;

    /// Hard delete a clan row
    async fn delete_clan(&mut self, id: i64) -> RepoResult<()>;

    /// Recompute `membership_count` as 1 + approved live memberships
    async fn refresh_clan_counters(&mut self, clan_id: i64) -> RepoResult<Clan>;
}

// ============================================================================
// Membership Repository
// ============================================================================

#[async_trait]
pub trait MembershipRepository: Send {
    /// Latest row for a (clan, player) pair: the live row if any, otherwise
    /// the most recently updated one
    async fn find_membership(&mut self, clan_id: i64, player_id: i64)
        -> RepoResult<Option<Membership>>;

    /// Same as [`find_membership`](Self::find_membership) with a row lock
    async fn lock_membership(&mut self, clan_id: i64, player_id: i64)
        -> RepoResult<Option<Membership>>;

    /// Live rows of a clan in creation order
    async fn clan_memberships(&mut self, clan_id: i64) -> RepoResult<Vec<Membership>>;

    /// Live rows of a player in creation order
    async fn player_memberships(&mut self, player_id: i64) -> RepoResult<Vec<Membership>>;

    /// Live pending invitations of a clan
    async fn count_pending_invites(&mut self, clan_id: i64) -> RepoResult<i64>;

    async fn insert_membership(&mut self, membership: &Membership) -> RepoResult<Membership>;

    async fn update_membership(&mut self, membership: &Membership) -> RepoResult<Membership>;

    /// Hard delete stale rows of a game; counters are left untouched
    async fn prune_memberships(
        &mut self,
        game_id: &str,
        options: &PruneOptions,
        now: i64,
    ) -> RepoResult<PruneCounts>;
}

// ============================================================================
// Hook Repository
// ============================================================================

#[async_trait]
pub trait HookRepository: Send {
    /// Every hook of every game, for the dispatcher registry
    async fn list_hooks(&mut self) -> RepoResult<Vec<Hook>>;

    async fn game_hooks(&mut self, game_id: &str) -> RepoResult<Vec<Hook>>;

    async fn find_hook(
        &mut self,
        game_id: &str,
        event_type: EventType,
        url: &str,
    ) -> RepoResult<Option<Hook>>;

    async fn insert_hook(&mut self, hook: &Hook) -> RepoResult<Hook>;

    /// Returns whether a row was deleted
    async fn delete_hook(&mut self, game_id: &str, public_id: &str) -> RepoResult<bool>;
}

// ============================================================================
// Transaction / Store
// ============================================================================

/// Unit of work. Dropping it without commit rolls back.
#[async_trait]
pub trait Transaction:
    GameRepository + PlayerRepository + ClanRepository + MembershipRepository + HookRepository + Send
{
    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

/// Primary store
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self, isolation: Isolation) -> RepoResult<Box<dyn Transaction>>;

    /// Connectivity probe
    async fn ping(&self) -> RepoResult<()>;
}
