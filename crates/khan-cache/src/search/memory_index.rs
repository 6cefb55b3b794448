//! In-process clan search index with the same matching rules as Redis

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use khan_core::error::DomainError;
use khan_core::traits::{ClanSearchIndex, RepoResult};
use khan_core::ClanDocument;

use super::by_name;

/// Documents per game, keyed by clan id
#[derive(Debug, Default)]
pub struct MemoryClanIndex {
    games: RwLock<HashMap<String, BTreeMap<i64, ClanDocument>>>,
    failures: AtomicU32,
}

impl MemoryClanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with an index error
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Stored document for a clan
    pub fn document(&self, game_id: &str, clan_id: i64) -> Option<ClanDocument> {
        self.games
            .read()
            .get(game_id)
            .and_then(|docs| docs.get(&clan_id))
            .cloned()
    }

    pub fn len(&self, game_id: &str) -> usize {
        self.games.read().get(game_id).map_or(0, BTreeMap::len)
    }

    fn check_failure(&self) -> RepoResult<()> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(DomainError::IndexError("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClanSearchIndex for MemoryClanIndex {
    async fn upsert(&self, game_id: &str, document: &ClanDocument) -> RepoResult<()> {
        self.check_failure()?;
        self.games
            .write()
            .entry(game_id.to_string())
            .or_default()
            .insert(document.clan_id, document.clone());
        Ok(())
    }

    async fn delete(&self, game_id: &str, clan_id: i64) -> RepoResult<()> {
        self.check_failure()?;
        if let Some(docs) = self.games.write().get_mut(game_id) {
            docs.remove(&clan_id);
        }
        Ok(())
    }

    async fn search(
        &self,
        game_id: &str,
        term: &str,
        limit: usize,
    ) -> RepoResult<Vec<ClanDocument>> {
        let games = self.games.read();
        let mut hits: Vec<ClanDocument> = games
            .get(game_id)
            .map(|docs| docs.values().filter(|doc| doc.matches(term)).cloned().collect())
            .unwrap_or_default();
        hits.sort_by(by_name);
        hits.truncate(limit);
        Ok(hits)
    }
}
