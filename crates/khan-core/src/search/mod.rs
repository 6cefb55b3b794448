//! Clan search documents and text folding

mod document;

pub use document::{fold, name_prefixes, query_tokens, ClanDocument};
