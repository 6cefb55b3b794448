//! Index queue counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::Notify;

/// Lock-free index job counters.
///
/// `pending` counts accepted jobs that are not yet applied or given up on.
#[derive(Debug, Default)]
pub struct IndexStats {
    enqueued: AtomicU64,
    overflowed: AtomicU64,
    applied: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    pending: AtomicU64,
    idle: Notify,
}

/// Point-in-time copy of [`IndexStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatsSnapshot {
    pub enqueued: u64,
    /// Rejected because the queue was full
    pub overflowed: u64,
    pub applied: u64,
    pub retried: u64,
    /// Given up on after the last attempt
    pub dropped: u64,
    pub pending: u64,
}

impl IndexStats {
    pub(crate) fn begin(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo [`begin`](Self::begin) for a job that never entered the queue
    pub(crate) fn overflowed(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
        self.finish();
    }

    pub(crate) fn retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        self.finish();
    }

    pub(crate) fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.finish();
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> IndexStatsSnapshot {
        IndexStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }

    /// Resolve once no job is pending
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
