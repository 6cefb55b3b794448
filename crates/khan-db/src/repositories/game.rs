//! PostgreSQL implementation of GameRepository

use async_trait::async_trait;
use sqlx::types::Json;
use tracing::instrument;

use khan_core::entities::Game;
use khan_core::error::{DomainError, EntityKind};
use khan_core::traits::{GameRepository, RepoResult};

use crate::models::{GameModel, GAME_COLUMNS};

use super::error::{duplicate, map_db_error, map_unique_violation};
use super::postgres::PgTransaction;

#[async_trait]
impl GameRepository for PgTransaction {
    #[instrument(skip(self))]
    async fn find_game(&mut self, public_id: &str) -> RepoResult<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE public_id = $1");
        let result = sqlx::query_as::<_, GameModel>(&sql)
            .bind(public_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_games(&mut self) -> RepoResult<Vec<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games ORDER BY id");
        let results = sqlx::query_as::<_, GameModel>(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, game), fields(game_id = %game.public_id))]
    async fn insert_game(&mut self, game: &Game) -> RepoResult<Game> {
        let sql = format!(
            r#"
            INSERT INTO games (
                public_id, name, metadata, membership_levels,
                min_level_to_accept_application, min_level_to_create_invitation,
                min_level_to_remove_member, min_level_offset_to_remove_member,
                min_level_offset_to_promote_member, min_level_offset_to_demote_member,
                max_members, max_clans_per_player, max_pending_invites,
                cooldown_after_deny, cooldown_after_delete, cooldown_before_apply,
                cooldown_before_invite, clan_hook_fields_whitelist,
                player_hook_fields_whitelist, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21)
            RETURNING {GAME_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, GameModel>(&sql)
            .bind(&game.public_id)
            .bind(&game.name)
            .bind(Json(&game.metadata))
            .bind(Json(&game.membership_levels))
            .bind(game.min_level_to_accept_application)
            .bind(game.min_level_to_create_invitation)
            .bind(game.min_level_to_remove_member)
            .bind(game.min_level_offset_to_remove_member)
            .bind(game.min_level_offset_to_promote_member)
            .bind(game.min_level_offset_to_demote_member)
            .bind(game.max_members)
            .bind(game.max_clans_per_player)
            .bind(game.max_pending_invites)
            .bind(game.cooldown_after_deny)
            .bind(game.cooldown_after_delete)
            .bind(game.cooldown_before_apply)
            .bind(game.cooldown_before_invite)
            .bind(&game.clan_hook_fields_whitelist)
            .bind(&game.player_hook_fields_whitelist)
            .bind(game.created_at)
            .bind(game.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || duplicate("Game", &game.public_id)))?;

        Ok(model.into())
    }

    #[instrument(skip(self, game), fields(game_id = %game.public_id))]
    async fn update_game(&mut self, game: &Game) -> RepoResult<Game> {
        let sql = format!(
            r#"
            UPDATE games SET
                name = $2, metadata = $3, membership_levels = $4,
                min_level_to_accept_application = $5, min_level_to_create_invitation = $6,
                min_level_to_remove_member = $7, min_level_offset_to_remove_member = $8,
                min_level_offset_to_promote_member = $9, min_level_offset_to_demote_member = $10,
                max_members = $11, max_clans_per_player = $12, max_pending_invites = $13,
                cooldown_after_deny = $14, cooldown_after_delete = $15,
                cooldown_before_apply = $16, cooldown_before_invite = $17,
                clan_hook_fields_whitelist = $18, player_hook_fields_whitelist = $19,
                updated_at = $20
            WHERE public_id = $1
            RETURNING {GAME_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, GameModel>(&sql)
            .bind(&game.public_id)
            .bind(&game.name)
            .bind(Json(&game.metadata))
            .bind(Json(&game.membership_levels))
            .bind(game.min_level_to_accept_application)
            .bind(game.min_level_to_create_invitation)
            .bind(game.min_level_to_remove_member)
            .bind(game.min_level_offset_to_remove_member)
            .bind(game.min_level_offset_to_promote_member)
            .bind(game.min_level_offset_to_demote_member)
            .bind(game.max_members)
            .bind(game.max_clans_per_player)
            .bind(game.max_pending_invites)
            .bind(game.cooldown_after_deny)
            .bind(game.cooldown_after_delete)
            .bind(game.cooldown_before_apply)
            .bind(game.cooldown_before_invite)
            .bind(&game.clan_hook_fields_whitelist)
            .bind(&game.player_hook_fields_whitelist)
            .bind(game.updated_at)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        model
            .map(Into::into)
            .ok_or_else(|| DomainError::not_found(EntityKind::Game, &game.public_id))
    }
}
