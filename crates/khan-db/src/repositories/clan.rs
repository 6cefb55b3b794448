//! PostgreSQL implementation of ClanRepository

use async_trait::async_trait;
use sqlx::types::Json;
use tracing::instrument;

use khan_core::entities::Clan;
use khan_core::error::{DomainError, EntityKind};
use khan_core::traits::{ClanRepository, RepoResult};

use crate::models::{ClanModel, CLAN_COLUMNS};

use super::error::{duplicate, map_db_error, map_unique_violation};
use super::postgres::PgTransaction;

#[async_trait]
impl ClanRepository for PgTransaction {
    #[instrument(skip(self))]
    async fn find_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>> {
        let sql = format!("SELECT {CLAN_COLUMNS} FROM clans WHERE game_id = $1 AND public_id = $2");
        let result = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(game_id)
            .bind(public_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn lock_clan(&mut self, game_id: &str, public_id: &str) -> RepoResult<Option<Clan>> {
        let sql = format!(
            "SELECT {CLAN_COLUMNS} FROM clans WHERE game_id = $1 AND public_id = $2 FOR UPDATE"
        );
        let result = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(game_id)
            .bind(public_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_clan_by_id(&mut self, id: i64) -> RepoResult<Option<Clan>> {
        let sql = format!("SELECT {CLAN_COLUMNS} FROM clans WHERE id = $1");
        let result = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_clans(&mut self, game_id: &str) -> RepoResult<Vec<Clan>> {
        let sql = format!("SELECT {CLAN_COLUMNS} FROM clans WHERE game_id = $1 ORDER BY name, id");
        let results = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(game_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, public_ids), fields(count = public_ids.len()))]
    async fn find_clans(&mut self, game_id: &str, public_ids: &[String]) -> RepoResult<Vec<Clan>> {
        if public_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {CLAN_COLUMNS} FROM clans WHERE game_id = $1 AND public_id = ANY($2) ORDER BY id"
        );
        let results = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(game_id)
            .bind(public_ids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, clan), fields(clan_id = %clan.public_id))]
    async fn insert_clan(&mut self, clan: &Clan) -> RepoResult<Clan> {
        let sql = format!(
            r#"
            INSERT INTO clans (game_id, public_id, name, metadata, allow_application, auto_join,
                               membership_count, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8, $9)
            RETURNING {CLAN_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(&clan.game_id)
            .bind(&clan.public_id)
            .bind(&clan.name)
            .bind(Json(&clan.metadata))
            .bind(clan.allow_application)
            .bind(clan.auto_join)
            .bind(clan.owner_id)
            .bind(clan.created_at)
            .bind(clan.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || duplicate("Clan", &clan.public_id)))?;

        Ok(model.into())
    }

    #[instrument(skip(self, clan), fields(clan_id = %clan.public_id))]
    async fn update_clan(&mut self, clan: &Clan) -> RepoResult<Clan> {
        let sql = format!(
            r#"
            UPDATE clans SET
                name = $2, metadata = $3, allow_application = $4, auto_join = $5,
                owner_id = $6, updated_at = $7
            WHERE id = $1
            RETURNING {CLAN_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(clan.id)
            .bind(&clan.name)
            .bind(Json(&clan.metadata))
            .bind(clan.allow_application)
            .bind(clan.auto_join)
            .bind(clan.owner_id)
            .bind(clan.updated_at)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Clan, &clan.public_id))?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn delete_clan(&mut self, id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM clans WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn refresh_clan_counters(&mut self, clan_id: i64) -> RepoResult<Clan> {
        let sql = format!(
            r#"
            UPDATE clans SET membership_count = 1 + (
                SELECT COUNT(*) FROM memberships
                WHERE clan_id = $1 AND approved AND deleted_at = 0
            )
            WHERE id = $1
            RETURNING {CLAN_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, ClanModel>(&sql)
            .bind(clan_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Clan, clan_id))?;

        Ok(model.into())
    }
}
