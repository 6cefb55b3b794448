//! In-process store
//!
//! [`MemoryStore`] keeps every table in memory behind a single async mutex.
//! A transaction holds the lock for its whole lifetime and works on a copy of
//! the tables, so transactions are fully serialized and a dropped transaction
//! leaves no trace. Used by the service and API test suites and by local runs
//! without PostgreSQL.

mod repositories;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use khan_core::entities::{Clan, Game, Hook, Membership, Player};
use khan_core::traits::{Isolation, RepoResult, Store, Transaction};

/// Tables keyed by surrogate id
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) games: BTreeMap<i64, Game>,
    pub(crate) players: BTreeMap<i64, Player>,
    pub(crate) clans: BTreeMap<i64, Clan>,
    pub(crate) memberships: BTreeMap<i64, Membership>,
    pub(crate) hooks: BTreeMap<i64, Hook>,
    last_id: i64,
}

impl Tables {
    /// Ids are shared across tables; only uniqueness matters
    pub(crate) fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory implementation of [`Store`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self, _isolation: Isolation) -> RepoResult<Box<dyn Transaction>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, work }))
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

/// Transaction over a private copy of the tables
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    pub(crate) work: Tables,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}
