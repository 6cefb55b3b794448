//! Bounded TTL cache with jittered expiry.
//!
//! Entries expire `ttl + jitter` after insertion, where the jitter is drawn
//! uniformly from `0..=max_jitter`. Expired entries are dropped lazily on
//! read and in bulk by [`TtlCache::spawn_cleanup`]. When full, an insert first
//! sweeps expired entries and then evicts the entry closest to expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use khan_common::CacheConfig;

/// TTL cache settings
#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    pub ttl: Duration,
    pub max_jitter: Duration,
    pub cleanup_interval: Duration,
    pub max_entries: usize,
}

impl From<&CacheConfig> for TtlCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
            cleanup_interval: config.cleanup_interval(),
            max_entries: config.max_entries,
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Concurrent TTL cache keyed by string
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    config: TtlCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(config: TtlCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone());

        match hit {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: String, value: V) {
        if self.config.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.cleanup();
            if self.entries.len() >= self.config.max_entries {
                self.evict_soonest();
            }
        }

        let expires_at = Instant::now() + self.config.ttl + self.jitter();
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Run [`cleanup`](Self::cleanup) every `cleanup_interval`
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = cache.config.cleanup_interval.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Expired cache entries dropped");
                }
            }
        })
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.config.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    fn evict_soonest(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

/// Cache key for a game and a set of clan public ids, independent of order
pub fn summary_key(game_id: &str, public_ids: &[String]) -> String {
    let mut ids: Vec<&str> = public_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    format!("{game_id}:{}", ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, max_entries: usize) -> TtlCache<String> {
        TtlCache::new(TtlCacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            max_jitter: Duration::ZERO,
            cleanup_interval: Duration::from_secs(1),
            max_entries,
        })
    }

    #[test]
    fn test_summary_key_is_canonical() {
        let a = summary_key("g1", &["b".to_string(), "a".to_string(), "b".to_string()]);
        let b = summary_key("g1", &["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a, "g1:a,b");
        assert_ne!(a, summary_key("g2", &["a".to_string(), "b".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = cache(60, 10);
        cache.insert("k".to_string(), "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_evicts_soonest_expiry() {
        let cache = cache(60, 2);
        cache.insert("old".to_string(), "1".to_string());
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.insert("new".to_string(), "2".to_string());
        cache.insert("newest".to_string(), "3".to_string());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("old").is_none());
        assert!(cache.get("newest").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_expired() {
        let cache = cache(1, 10);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("b".to_string(), "2".to_string());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.cleanup(), 2);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let cache: TtlCache<String> = TtlCache::new(TtlCacheConfig {
            ttl: Duration::from_secs(1),
            max_jitter: Duration::from_millis(50),
            cleanup_interval: Duration::from_secs(1),
            max_entries: 1,
        });
        for _ in 0..100 {
            assert!(cache.jitter() <= Duration::from_millis(50));
        }
    }
}
