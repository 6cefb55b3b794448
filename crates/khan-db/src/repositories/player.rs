//! PostgreSQL implementation of PlayerRepository

use async_trait::async_trait;
use sqlx::types::Json;
use tracing::instrument;

use khan_core::entities::Player;
use khan_core::error::{DomainError, EntityKind};
use khan_core::traits::{PlayerRepository, RepoResult};

use crate::mappers::PlayerWrite;
use crate::models::{PlayerModel, PLAYER_COLUMNS};

use super::error::{duplicate, map_db_error, map_unique_violation};
use super::postgres::PgTransaction;

impl PgTransaction {
    fn decode_player(&self, model: PlayerModel) -> RepoResult<Player> {
        model.into_player(&self.cipher)
    }

    fn decode_players(&self, models: Vec<PlayerModel>) -> RepoResult<Vec<Player>> {
        models
            .into_iter()
            .map(|model| self.decode_player(model))
            .collect()
    }
}

#[async_trait]
impl PlayerRepository for PgTransaction {
    #[instrument(skip(self))]
    async fn find_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>> {
        let sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE game_id = $1 AND public_id = $2"
        );
        let result = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(game_id)
            .bind(public_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        result.map(|model| self.decode_player(model)).transpose()
    }

    #[instrument(skip(self))]
    async fn lock_player(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Player>> {
        let sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE game_id = $1 AND public_id = $2 FOR UPDATE"
        );
        let result = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(game_id)
            .bind(public_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        result.map(|model| self.decode_player(model)).transpose()
    }

    #[instrument(skip(self))]
    async fn find_player_by_id(&mut self, id: i64) -> RepoResult<Option<Player>> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1");
        let result = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        result.map(|model| self.decode_player(model)).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_players_by_ids(&mut self, ids: &[i64]) -> RepoResult<Vec<Player>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ANY($1) ORDER BY id");
        let results = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(ids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        self.decode_players(results)
    }

    #[instrument(skip(self, player), fields(player_id = %player.public_id))]
    async fn insert_player(&mut self, player: &Player) -> RepoResult<Player> {
        let write = PlayerWrite::new(player, &self.cipher)?;
        let sql = format!(
            r#"
            INSERT INTO players (game_id, public_id, name, metadata, membership_count,
                                 ownership_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, 0, $5, $6)
            RETURNING {PLAYER_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(&write.player.game_id)
            .bind(&write.player.public_id)
            .bind(&write.stored_name)
            .bind(Json(&write.player.metadata))
            .bind(write.player.created_at)
            .bind(write.player.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || duplicate("Player", &player.public_id)))?;

        self.decode_player(model)
    }

    #[instrument(skip(self, player), fields(player_id = %player.public_id))]
    async fn update_player(&mut self, player: &Player) -> RepoResult<Player> {
        let write = PlayerWrite::new(player, &self.cipher)?;
        let sql = format!(
            r#"
            UPDATE players SET name = $2, metadata = $3, updated_at = $4
            WHERE id = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(write.player.id)
            .bind(&write.stored_name)
            .bind(Json(&write.player.metadata))
            .bind(write.player.updated_at)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Player, &player.public_id))?;

        self.decode_player(model)
    }

    #[instrument(skip(self))]
    async fn refresh_player_counters(&mut self, player_id: i64) -> RepoResult<Player> {
        let sql = format!(
            r#"
            UPDATE players SET
                membership_count = (
                    SELECT COUNT(*) FROM memberships
                    WHERE player_id = $1 AND approved AND deleted_at = 0
                ),
                ownership_count = (
                    SELECT COUNT(*) FROM clans WHERE owner_id = $1
                )
            WHERE id = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, PlayerModel>(&sql)
            .bind(player_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Player, player_id))?;

        self.decode_player(model)
    }
}
