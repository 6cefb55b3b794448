//! Redis-backed clan search index.
//!
//! Per game namespace `ns` (see [`SearchConfig::collection_for`]):
//!
//! - `{ns}:docs` is a hash of clan id to the JSON document
//! - `{ns}:token:{token}` is a set of clan ids for each folded word and
//!   word prefix of the clan name
//!
//! A search intersects the token sets of every query word.

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use khan_common::SearchConfig;
use khan_core::error::DomainError;
use khan_core::search::query_tokens;
use khan_core::traits::{ClanSearchIndex, RepoResult};
use khan_core::ClanDocument;

use crate::pool::{RedisPool, RedisPoolError};

use super::by_name;

fn index_error(e: impl Into<RedisPoolError>) -> DomainError {
    DomainError::IndexError(e.into().to_string())
}

/// Clan search index stored in Redis
#[derive(Debug, Clone)]
pub struct RedisClanIndex {
    pool: RedisPool,
    config: SearchConfig,
}

impl RedisClanIndex {
    pub fn new(pool: RedisPool, config: SearchConfig) -> Self {
        Self { pool, config }
    }

    fn docs_key(&self, game_id: &str) -> String {
        format!("{}:docs", self.config.collection_for(game_id))
    }

    fn token_key(&self, game_id: &str, token: &str) -> String {
        format!("{}:token:{token}", self.config.collection_for(game_id))
    }

    async fn stored(&self, game_id: &str, clan_id: i64) -> RepoResult<Option<ClanDocument>> {
        let mut conn = self.pool.get().await.map_err(index_error)?;
        let raw: Option<String> = conn
            .hget(self.docs_key(game_id), clan_id)
            .await
            .map_err(index_error)?;
        raw.map(|json| serde_json::from_str(&json).map_err(index_error))
            .transpose()
    }

    pub async fn ping(&self) -> RepoResult<()> {
        self.pool.health_check().await.map_err(index_error)
    }
}

#[async_trait]
impl ClanSearchIndex for RedisClanIndex {
    #[instrument(skip(self, document), fields(clan_id = document.clan_id))]
    async fn upsert(&self, game_id: &str, document: &ClanDocument) -> RepoResult<()> {
        let previous = self.stored(game_id, document.clan_id).await?;
        let tokens = document.tokens();
        let stale: BTreeSet<String> = previous
            .map(|doc| doc.tokens().difference(&tokens).cloned().collect())
            .unwrap_or_default();
        let json = serde_json::to_string(document).map_err(index_error)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for token in &stale {
            pipe.srem(self.token_key(game_id, token), document.clan_id)
                .ignore();
        }
        for token in &tokens {
            pipe.sadd(self.token_key(game_id, token), document.clan_id)
                .ignore();
        }
        pipe.hset(self.docs_key(game_id), document.clan_id, json)
            .ignore();

        let mut conn = self.pool.get().await.map_err(index_error)?;
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(index_error)?;

        debug!(tokens = tokens.len(), stale = stale.len(), "Clan document indexed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, game_id: &str, clan_id: i64) -> RepoResult<()> {
        let Some(previous) = self.stored(game_id, clan_id).await? else {
            return Ok(());
        };

        let mut pipe = redis::pipe();
        pipe.atomic();
        for token in previous.tokens() {
            pipe.srem(self.token_key(game_id, &token), clan_id).ignore();
        }
        pipe.hdel(self.docs_key(game_id), clan_id).ignore();

        let mut conn = self.pool.get().await.map_err(index_error)?;
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(index_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        game_id: &str,
        term: &str,
        limit: usize,
    ) -> RepoResult<Vec<ClanDocument>> {
        let tokens = query_tokens(term);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = tokens
            .iter()
            .map(|token| self.token_key(game_id, token))
            .collect();
        let mut conn = self.pool.get().await.map_err(index_error)?;
        let ids: Vec<i64> = conn.sinter(keys).await.map_err(index_error)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(self.docs_key(game_id))
            .arg(&ids)
            .query_async(&mut conn)
            .await
            .map_err(index_error)?;

        let mut documents = raw
            .into_iter()
            .flatten()
            .map(|json| serde_json::from_str::<ClanDocument>(&json).map_err(index_error))
            .collect::<RepoResult<Vec<_>>>()?;
        documents.sort_by(by_name);
        documents.truncate(limit);
        Ok(documents)
    }
}
