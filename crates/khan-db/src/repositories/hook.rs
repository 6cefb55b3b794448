//! PostgreSQL implementation of HookRepository

use async_trait::async_trait;
use tracing::instrument;

use khan_core::entities::Hook;
use khan_core::events::EventType;
use khan_core::traits::{HookRepository, RepoResult};

use crate::models::{HookModel, HOOK_COLUMNS};

use super::error::{duplicate, map_db_error, map_unique_violation};
use super::postgres::PgTransaction;

fn into_hooks(models: Vec<HookModel>) -> RepoResult<Vec<Hook>> {
    models.into_iter().map(Hook::try_from).collect()
}

#[async_trait]
impl HookRepository for PgTransaction {
    #[instrument(skip(self))]
    async fn list_hooks(&mut self) -> RepoResult<Vec<Hook>> {
        let sql = format!("SELECT {HOOK_COLUMNS} FROM hooks ORDER BY id");
        let results = sqlx::query_as::<_, HookModel>(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        into_hooks(results)
    }

    #[instrument(skip(self))]
    async fn game_hooks(&mut self, game_id: &str) -> RepoResult<Vec<Hook>> {
        let sql = format!("SELECT {HOOK_COLUMNS} FROM hooks WHERE game_id = $1 ORDER BY id");
        let results = sqlx::query_as::<_, HookModel>(&sql)
            .bind(game_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        into_hooks(results)
    }

    #[instrument(skip(self))]
    async fn find_hook(
        &mut self,
        game_id: &str,
        event_type: EventType,
        url: &str,
    ) -> RepoResult<Option<Hook>> {
        let sql = format!(
            "SELECT {HOOK_COLUMNS} FROM hooks WHERE game_id = $1 AND event_type = $2 AND url = $3"
        );
        let result = sqlx::query_as::<_, HookModel>(&sql)
            .bind(game_id)
            .bind(event_type.code())
            .bind(url)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        result.map(Hook::try_from).transpose()
    }

    #[instrument(skip(self, hook), fields(hook_id = %hook.public_id))]
    async fn insert_hook(&mut self, hook: &Hook) -> RepoResult<Hook> {
        let sql = format!(
            r#"
            INSERT INTO hooks (game_id, public_id, event_type, url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {HOOK_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, HookModel>(&sql)
            .bind(&hook.game_id)
            .bind(&hook.public_id)
            .bind(hook.event_type.code())
            .bind(&hook.url)
            .bind(hook.created_at)
            .bind(hook.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || duplicate("Hook", &hook.public_id)))?;

        Hook::try_from(model)
    }

    #[instrument(skip(self))]
    async fn delete_hook(&mut self, game_id: &str, public_id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM hooks WHERE game_id = $1 AND public_id = $2")
            .bind(game_id)
            .bind(public_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
