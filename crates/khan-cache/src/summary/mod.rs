//! Bounded in-process TTL cache for clan summaries

mod ttl_cache;

pub use ttl_cache::{summary_key, TtlCache, TtlCacheConfig};
