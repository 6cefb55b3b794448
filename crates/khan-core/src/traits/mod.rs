//! Ports implemented by the infrastructure crates

mod events;
mod repositories;
mod search;

pub use events::EventSink;
pub use repositories::{
    ClanRepository, GameRepository, HookRepository, Isolation, MembershipRepository,
    PlayerRepository, RepoResult, Store, Transaction,
};
pub use search::ClanSearchIndex;
