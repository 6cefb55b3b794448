use async_trait::async_trait;

use super::repositories::RepoResult;
use crate::search::ClanDocument;

/// Secondary store holding one searchable document per clan
#[async_trait]
pub trait ClanSearchIndex: Send + Sync {
    /// Replace the whole document for `document.clan_id`
    async fn upsert(&self, game_id: &str, document: &ClanDocument) -> RepoResult<()>;

    /// Remove a clan's document; removing a missing document is not an error
    async fn delete(&self, game_id: &str, clan_id: i64) -> RepoResult<()>;

    /// Documents whose name matches every word of `term`, at most `limit`
    async fn search(&self, game_id: &str, term: &str, limit: usize)
        -> RepoResult<Vec<ClanDocument>>;
}
