//! PostgreSQL implementation of MembershipRepository

use async_trait::async_trait;
use tracing::{debug, instrument};

use khan_core::entities::Membership;
use khan_core::error::{DomainError, EntityKind};
use khan_core::traits::{MembershipRepository, RepoResult};
use khan_core::value_objects::{PruneCounts, PruneOptions};

use crate::models::{MembershipModel, MEMBERSHIP_COLUMNS};

use super::error::{map_db_error, map_unique_violation};
use super::postgres::PgTransaction;

/// Live row first, then the most recently touched terminal row
const LATEST_FOR_PAIR: &str = "WHERE clan_id = $1 AND player_id = $2 \
    ORDER BY (deleted_at = 0) DESC, updated_at DESC, id DESC LIMIT 1";

impl PgTransaction {
    async fn prune(&mut self, filter: &str, game_id: &str, cutoff: i64) -> RepoResult<u64> {
        let sql = format!("DELETE FROM memberships WHERE game_id = $1 AND updated_at < $2 AND {filter}");
        let result = sqlx::query(&sql)
            .bind(game_id)
            .bind(cutoff)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

fn live_pair_conflict(membership: &Membership) -> DomainError {
    DomainError::IntegrityError(format!(
        "player {} already has a live membership in clan {}",
        membership.player_id, membership.clan_id
    ))
}

#[async_trait]
impl MembershipRepository for PgTransaction {
    #[instrument(skip(self))]
    async fn find_membership(
        &mut self,
        clan_id: i64,
        player_id: i64,
    ) -> RepoResult<Option<Membership>> {
        let sql = format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships {LATEST_FOR_PAIR}");
        let result = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(clan_id)
            .bind(player_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn lock_membership(
        &mut self,
        clan_id: i64,
        player_id: i64,
    ) -> RepoResult<Option<Membership>> {
        let sql =
            format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships {LATEST_FOR_PAIR} FOR UPDATE");
        let result = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(clan_id)
            .bind(player_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn clan_memberships(&mut self, clan_id: i64) -> RepoResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships \
             WHERE clan_id = $1 AND deleted_at = 0 ORDER BY created_at, id"
        );
        let results = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(clan_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn player_memberships(&mut self, player_id: i64) -> RepoResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships \
             WHERE player_id = $1 AND deleted_at = 0 ORDER BY created_at, id"
        );
        let results = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(player_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count_pending_invites(&mut self, clan_id: i64) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE clan_id = $1 AND deleted_at = 0 AND NOT approved AND NOT denied
              AND NOT banned AND requestor_id <> player_id
            "#,
        )
        .bind(clan_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }

    #[instrument(skip(self, membership), fields(clan_id = membership.clan_id, player_id = membership.player_id))]
    async fn insert_membership(&mut self, membership: &Membership) -> RepoResult<Membership> {
        let sql = format!(
            r#"
            INSERT INTO memberships (
                game_id, clan_id, player_id, membership_level, approved, denied, banned,
                requestor_id, approver_id, denier_id, deleted_by, message,
                created_at, updated_at, approved_at, denied_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(&membership.game_id)
            .bind(membership.clan_id)
            .bind(membership.player_id)
            .bind(&membership.level)
            .bind(membership.approved)
            .bind(membership.denied)
            .bind(membership.banned)
            .bind(membership.requestor_id)
            .bind(membership.approver_id)
            .bind(membership.denier_id)
            .bind(membership.deleted_by)
            .bind(&membership.message)
            .bind(membership.created_at)
            .bind(membership.updated_at)
            .bind(membership.approved_at)
            .bind(membership.denied_at)
            .bind(membership.deleted_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || live_pair_conflict(membership)))?;

        Ok(model.into())
    }

    #[instrument(skip(self, membership), fields(membership_id = membership.id))]
    async fn update_membership(&mut self, membership: &Membership) -> RepoResult<Membership> {
        let sql = format!(
            r#"
            UPDATE memberships SET
                membership_level = $2, approved = $3, denied = $4, banned = $5,
                requestor_id = $6, approver_id = $7, denier_id = $8, deleted_by = $9,
                message = $10, updated_at = $11, approved_at = $12, denied_at = $13,
                deleted_at = $14
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );
        let model = sqlx::query_as::<_, MembershipModel>(&sql)
            .bind(membership.id)
            .bind(&membership.level)
            .bind(membership.approved)
            .bind(membership.denied)
            .bind(membership.banned)
            .bind(membership.requestor_id)
            .bind(membership.approver_id)
            .bind(membership.denier_id)
            .bind(membership.deleted_by)
            .bind(&membership.message)
            .bind(membership.updated_at)
            .bind(membership.approved_at)
            .bind(membership.denied_at)
            .bind(membership.deleted_at)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || live_pair_conflict(membership)))?
            .ok_or_else(|| DomainError::not_found(EntityKind::Membership, membership.id))?;

        Ok(model.into())
    }

    #[instrument(skip(self, options))]
    async fn prune_memberships(
        &mut self,
        game_id: &str,
        options: &PruneOptions,
        now: i64,
    ) -> RepoResult<PruneCounts> {
        let cutoff = |ttl_secs: i64| PruneOptions::cutoff(now, ttl_secs);

        let counts = PruneCounts {
            pending_applications_pruned: self
                .prune(
                    "deleted_at = 0 AND NOT approved AND NOT denied AND requestor_id = player_id",
                    game_id,
                    cutoff(options.pending_applications),
                )
                .await?,
            pending_invites_pruned: self
                .prune(
                    "deleted_at = 0 AND NOT approved AND NOT denied AND requestor_id <> player_id",
                    game_id,
                    cutoff(options.pending_invites),
                )
                .await?,
            denied_memberships_pruned: self
                .prune("denied", game_id, cutoff(options.denied_memberships))
                .await?,
            deleted_memberships_pruned: self
                .prune("deleted_at > 0", game_id, cutoff(options.deleted_memberships))
                .await?,
        };

        debug!(total = counts.total(), "Pruned memberships");
        Ok(counts)
    }
}
