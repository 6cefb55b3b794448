//! PgStore and its transaction

use std::sync::Arc;

use async_trait::async_trait;
use khan_common::NameCipher;
use khan_core::traits::{Isolation, RepoResult, Store, Transaction};
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use super::error::map_db_error;

/// PostgreSQL store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    cipher: Arc<NameCipher>,
}

impl PgStore {
    /// Create a new PgStore
    pub fn new(pool: PgPool, cipher: Arc<NameCipher>) -> Self {
        Self { pool, cipher }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn begin(&self, isolation: Isolation) -> RepoResult<Box<dyn Transaction>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        if isolation == Isolation::Serializable {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }
        Ok(Box::new(PgTransaction {
            tx,
            cipher: Arc::clone(&self.cipher),
        }))
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}

/// Open PostgreSQL transaction; rolled back on drop unless committed
pub struct PgTransaction {
    pub(super) tx: sqlx::Transaction<'static, Postgres>,
    pub(super) cipher: Arc<NameCipher>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await.map_err(map_db_error)
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await.map_err(map_db_error)
    }
}
