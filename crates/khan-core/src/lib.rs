//! # khan-core
//!
//! Domain layer for the clan service: entities, the policy engine, domain
//! events, and the ports (store, search index, event sink) implemented by
//! the infrastructure crates. No database or web framework types leak in here.

pub mod entities;
pub mod error;
pub mod events;
pub mod policy;
pub mod search;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Clan, Game, Hook, Membership, MembershipState, Player};
pub use error::{CooldownKind, DomainError, EntityKind, PolicyError};
pub use events::{DomainEvent, EventType};
pub use search::ClanDocument;
pub use traits::{
    ClanRepository, ClanSearchIndex, EventSink, GameRepository, HookRepository, Isolation,
    MembershipRepository, PlayerRepository, RepoResult, Store, Transaction,
};
pub use value_objects::{
    now_ms, Clock, ManualClock, MembershipLevels, Metadata, PruneCounts, PruneOptions,
    SystemClock,
};
