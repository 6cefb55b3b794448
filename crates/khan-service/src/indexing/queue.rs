//! Index job queue
//!
//! Jobs are sharded by clan id over one bounded channel per worker, so the
//! jobs of a single clan are applied in enqueue order. A failed job is
//! retried in place with exponential backoff until `max_attempts`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use khan_common::SearchConfig;
use khan_core::entities::Clan;
use khan_core::traits::{ClanSearchIndex, RepoResult};
use khan_core::ClanDocument;

use super::stats::{IndexStats, IndexStatsSnapshot};

/// Index job tuning
#[derive(Debug, Clone)]
pub struct IndexQueueConfig {
    pub workers: usize,
    pub queue_size: usize,
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further attempt
    pub backoff: Duration,
}

impl Default for IndexQueueConfig {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for IndexQueueConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            queue_size: config.queue_size.max(1),
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Operation applied to a clan's document
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOp {
    /// Replace the whole document
    Upsert(ClanDocument),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexJob {
    pub game_id: String,
    pub clan_id: i64,
    pub op: IndexOp,
}

impl IndexJob {
    pub fn upsert(clan: &Clan) -> Self {
        Self {
            game_id: clan.game_id.clone(),
            clan_id: clan.id,
            op: IndexOp::Upsert(ClanDocument::from(clan)),
        }
    }

    pub fn delete(game_id: impl Into<String>, clan_id: i64) -> Self {
        Self {
            game_id: game_id.into(),
            clan_id,
            op: IndexOp::Delete,
        }
    }

    async fn apply(&self, index: &dyn ClanSearchIndex) -> RepoResult<()> {
        match &self.op {
            IndexOp::Upsert(document) => index.upsert(&self.game_id, document).await,
            IndexOp::Delete => index.delete(&self.game_id, self.clan_id).await,
        }
    }
}

/// Bounded background queue in front of the search index
pub struct IndexQueue {
    shards: Vec<mpsc::Sender<IndexJob>>,
    index: Arc<dyn ClanSearchIndex>,
    stats: Arc<IndexStats>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for IndexQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexQueue")
            .field("shards", &self.shards.len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl IndexQueue {
    /// Create the queue and spawn its workers on the current runtime
    pub fn start(config: IndexQueueConfig, index: Arc<dyn ClanSearchIndex>) -> Arc<Self> {
        let workers = config.workers.max(1);
        let shard_capacity = (config.queue_size / workers).max(1);
        let stats = Arc::new(IndexStats::default());

        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (sender, receiver) = mpsc::channel(shard_capacity);
            shards.push(sender);
            let index = Arc::clone(&index);
            let stats = Arc::clone(&stats);
            let config = config.clone();
            handles.push(tokio::spawn(async move {
                run_worker(worker, receiver, index, stats, config).await;
            }));
        }

        info!(
            workers,
            shard_capacity,
            max_attempts = config.max_attempts,
            backoff_ms = config.backoff.as_millis() as u64,
            "Index queue started"
        );

        Arc::new(Self {
            shards,
            index,
            stats,
            workers: parking_lot::Mutex::new(handles),
        })
    }

    /// Index used for reads
    pub fn index(&self) -> &Arc<dyn ClanSearchIndex> {
        &self.index
    }

    pub fn stats(&self) -> IndexStatsSnapshot {
        self.stats.snapshot()
    }

    /// Queue a job; never blocks. Returns false when the shard is full.
    pub fn enqueue(&self, job: IndexJob) -> bool {
        let shard = job.clan_id.rem_euclid(self.shards.len() as i64) as usize;
        // Count before sending so a fast worker cannot finish it first
        self.stats.begin();
        match self.shards[shard].try_send(job) {
            Ok(()) => {
                self.stats.enqueued();
                true
            }
            Err(err) => {
                let job = err.into_inner();
                self.stats.overflowed();
                warn!(
                    game_id = %job.game_id,
                    clan_id = job.clan_id,
                    "Index queue full, job dropped"
                );
                false
            }
        }
    }

    /// Resolve once every accepted job is applied or dropped
    pub async fn wait(&self) {
        self.stats.wait_idle().await;
    }

    /// Wait up to `grace` for pending jobs, then stop the workers.
    ///
    /// Returns whether the queue drained in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let drained = tokio::time::timeout(grace, self.wait()).await.is_ok();
        if !drained {
            warn!(
                pending = self.stats.pending(),
                "Index queue not drained within grace period"
            );
        }
        for worker in self.workers.lock().drain(..) {
            worker.abort();
        }
        info!(drained, "Index queue stopped");
        drained
    }
}

async fn run_worker(
    worker: usize,
    mut receiver: mpsc::Receiver<IndexJob>,
    index: Arc<dyn ClanSearchIndex>,
    stats: Arc<IndexStats>,
    config: IndexQueueConfig,
) {
    while let Some(job) = receiver.recv().await {
        let mut attempt = 1;
        loop {
            match job.apply(index.as_ref()).await {
                Ok(()) => {
                    debug!(worker, clan_id = job.clan_id, attempt, "Index job applied");
                    stats.applied();
                    break;
                }
                Err(e) if attempt >= config.max_attempts => {
                    error!(
                        worker,
                        game_id = %job.game_id,
                        clan_id = job.clan_id,
                        attempt,
                        error = %e,
                        "Index job failed, giving up"
                    );
                    stats.dropped();
                    break;
                }
                Err(e) => {
                    let delay = backoff(config.backoff, attempt);
                    warn!(
                        worker,
                        clan_id = job.clan_id,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Index job failed, retrying"
                    );
                    stats.retried();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
    debug!(worker, "Index queue closed, worker exiting");
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << attempt.saturating_sub(1).min(16))
}
