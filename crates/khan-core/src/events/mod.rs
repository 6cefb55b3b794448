//! Domain events and the update-notification whitelist

mod domain_event;
mod event_type;
mod whitelist;

pub use domain_event::{
    ClanPayload, DomainEvent, GamePayload, MembershipPayload, PlayerPayload,
};
pub use event_type::EventType;
pub use whitelist::{should_notify_clan_update, should_notify_player_update};
