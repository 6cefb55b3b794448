//! Clan search index implementations

mod memory_index;
mod redis_index;

pub use memory_index::MemoryClanIndex;
pub use redis_index::RedisClanIndex;

use std::cmp::Ordering;

use khan_core::ClanDocument;

/// Result order shared by both indexes
fn by_name(a: &ClanDocument, b: &ClanDocument) -> Ordering {
    a.name.cmp(&b.name).then(a.clan_id.cmp(&b.clan_id))
}
