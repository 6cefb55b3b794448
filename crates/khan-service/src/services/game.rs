//! Game service
//!
//! Creates and updates tenants. Only updates emit `game_updated`; a brand
//! new game has no hooks to notify yet.

use tracing::{info, instrument};

use khan_core::traits::{GameRepository, Isolation};
use khan_core::DomainEvent;

use crate::dto::{CreatedResponse, EmptyResponse, GameRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Game service
pub struct GameService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GameService<'a> {
    /// Create a new GameService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a game from a validated request
    #[instrument(skip(self, request))]
    pub async fn create_game(&self, request: GameRequest) -> ServiceResult<CreatedResponse> {
        let public_id = request
            .public_id
            .clone()
            .ok_or_else(|| ServiceError::validation("publicID is required"))?;
        let game = request.into_game(&public_id, self.ctx.defaults(), self.ctx.now());
        game.validate()?;

        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let game = tx.insert_game(&game).await?;
        self.ctx.commit(tx, Vec::new(), Vec::new()).await?;

        info!(game_id = %game.public_id, "Game created");
        Ok(CreatedResponse {
            public_id: game.public_id,
        })
    }

    /// Update the game at `game_id`, creating it when absent
    #[instrument(skip(self, request))]
    pub async fn upsert_game(
        &self,
        game_id: &str,
        request: GameRequest,
    ) -> ServiceResult<EmptyResponse> {
        let now = self.ctx.now();
        let mut game = request.into_game(game_id, self.ctx.defaults(), now);
        game.validate()?;

        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        match tx.find_game(game_id).await? {
            Some(existing) => {
                game.id = existing.id;
                game.created_at = existing.created_at;
                let game = tx.update_game(&game).await?;
                let event = DomainEvent::game_updated(&game);
                self.ctx.commit(tx, vec![event], Vec::new()).await?;
                info!(game_id = %game_id, "Game updated");
            }
            None => {
                tx.insert_game(&game).await?;
                self.ctx.commit(tx, Vec::new(), Vec::new()).await?;
                info!(game_id = %game_id, "Game created on update");
            }
        }
        Ok(EmptyResponse {})
    }
}
