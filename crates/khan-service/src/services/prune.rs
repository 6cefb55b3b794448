//! Pruner
//!
//! Hard-deletes stale membership rows per game. Games without all four
//! expirations in their metadata are skipped. Counters are not touched
//! since pruned rows are never counted.

use serde::Serialize;
use tracing::{info, instrument, warn};

use khan_core::entities::Game;
use khan_core::traits::{GameRepository, Isolation, MembershipRepository};
use khan_core::value_objects::{PruneCounts, PruneOptions};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Rows removed from one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePruneResult {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(flatten)]
    pub counts: PruneCounts,
}

/// Prune service
pub struct PruneService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PruneService<'a> {
    /// Create a new PruneService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One pass over every game with expirations configured
    #[instrument(skip(self))]
    pub async fn run_all(&self) -> ServiceResult<Vec<GamePruneResult>> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let games = tx.list_games().await?;
        tx.rollback().await?;

        let mut results = Vec::new();
        for game in &games {
            match self.prune_game(game).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => warn!(game_id = %game.public_id, error = %e, "Pruning failed"),
            }
        }
        Ok(results)
    }

    /// Prune one game; `None` when it has no expirations configured
    pub async fn prune_game(&self, game: &Game) -> ServiceResult<Option<GamePruneResult>> {
        let Some(options) = PruneOptions::from_metadata(&game.metadata) else {
            return Ok(None);
        };

        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let counts = tx
            .prune_memberships(&game.public_id, &options, self.ctx.now())
            .await?;
        tx.commit().await?;

        info!(
            game_id = %game.public_id,
            pending_applications = counts.pending_applications_pruned,
            pending_invites = counts.pending_invites_pruned,
            denied = counts.denied_memberships_pruned,
            deleted = counts.deleted_memberships_pruned,
            "Game pruned"
        );
        Ok(Some(GamePruneResult {
            game_id: game.public_id.clone(),
            counts,
        }))
    }
}
