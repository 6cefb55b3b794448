//! # khan-cache
//!
//! Secondary stores fronting the primary database.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Search Index**: Redis-backed clan name index with word and prefix
//!   tokens, plus an in-process index with the same matching rules
//! - **TTL Cache**: Bounded in-process cache with jittered expiry for clan
//!   summaries
//!
//! ## Example
//!
//! ```ignore
//! use khan_cache::{RedisClanIndex, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let index = RedisClanIndex::new(pool, search_config);
//! index.upsert("my-game", &ClanDocument::from(&clan)).await?;
//! let hits = index.search("my-game", "dark", 50).await?;
//! ```

pub mod pool;
pub mod search;
pub mod summary;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export search index types
pub use search::{MemoryClanIndex, RedisClanIndex};

// Re-export cache types
pub use summary::{summary_key, TtlCache, TtlCacheConfig};
