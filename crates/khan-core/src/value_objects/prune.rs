//! Pruning options and results

use serde::{Deserialize, Serialize};

use super::Metadata;

/// Per-game expirations, in seconds, for stale membership rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneOptions {
    pub pending_applications: i64,
    pub pending_invites: i64,
    pub denied_memberships: i64,
    pub deleted_memberships: i64,
}

impl PruneOptions {
    /// Read expirations from game metadata.
    ///
    /// Returns `None` unless all four keys hold a non-negative integer.
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        let read = |key: &str| {
            metadata
                .get(key)
                .and_then(serde_json::Value::as_i64)
                .filter(|secs| *secs >= 0)
        };
        Some(Self {
            pending_applications: read("pendingApplicationsExpiration")?,
            pending_invites: read("pendingInvitesExpiration")?,
            denied_memberships: read("deniedMembershipsExpiration")?,
            deleted_memberships: read("deletedMembershipsExpiration")?,
        })
    }

    /// Rows last updated before the returned ms timestamp are stale.
    /// Saturates, so a huge expiration never selects anything.
    pub fn cutoff(now: i64, ttl_secs: i64) -> i64 {
        now.saturating_sub(ttl_secs.saturating_mul(1000))
    }
}

/// Rows removed by one pruning pass over a game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneCounts {
    pub pending_applications_pruned: u64,
    pub pending_invites_pruned: u64,
    pub denied_memberships_pruned: u64,
    pub deleted_memberships_pruned: u64,
}

impl PruneCounts {
    pub fn total(&self) -> u64 {
        self.pending_applications_pruned
            + self.pending_invites_pruned
            + self.denied_memberships_pruned
            + self.deleted_memberships_pruned
    }
}
